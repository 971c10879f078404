pub mod common;
pub mod a001_customer_group;
pub mod a002_price_list;
pub mod a003_price_record;
