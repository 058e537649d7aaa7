//! Shared constants for test infrastructure

pub const APP_NAME: &str = "MyApp";
pub const APP_EXE: &str = "MyApp.exe";
pub const APP_UPDATE_EXE: &str = "MyApp.update.exe";

pub const UPDATE_SUFFIX: &str = ".update.exe";
pub const EXE_EXTENSION: &str = ".exe";

pub const VERSION_1_0_0: &str = "1.0.0";
pub const VERSION_1_1_0: &str = "1.1.0";

pub const TAG_V1_0_0: &str = "v1.0.0";
pub const TAG_V1_1_0: &str = "v1.1.0";
pub const TAG_V1_2_0_BETA: &str = "v1.2.0-beta.1";

pub const FEED_PATH: &str = "/repos/acme/myapp/releases";

pub const OLD_BINARY: &[u8] = b"old binary";
pub const NEW_BINARY: &[u8] = b"new binary content for testing";
