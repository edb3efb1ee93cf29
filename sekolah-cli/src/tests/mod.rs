//! Shared test harness modules for the `sekolah` CLI.

use super::*;

mod helpers;
