pub mod config_cmd;
pub mod evaluate;
pub mod optimize;
