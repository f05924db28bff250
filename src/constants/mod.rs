use std::sync::LazyLock;

pub mod bashim;
pub mod telegram;
pub mod version;

pub static STARTUP_TIME: LazyLock<std::time::SystemTime> =
    LazyLock::new(std::time::SystemTime::now);
