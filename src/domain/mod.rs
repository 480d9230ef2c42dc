pub mod approval;
pub mod ledger;
pub mod payment;
pub mod ports;
pub mod work_item;
