use std::sync::Once;

use log::LevelFilter;

static INIT: Once = Once::new();

pub fn init_test_logger() {
    INIT.call_once(|| {
        let _ = env_logger::builder()
            .filter_level(LevelFilter::Debug)
            .is_test(true)
            .parse_default_env()
            .try_init();
    });
}
