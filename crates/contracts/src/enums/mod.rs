pub mod price_list_status;
