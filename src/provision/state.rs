// ABOUTME: Provisioning state marker types for the type state pattern.
// ABOUTME: States carry the data earned by the transition that produced them.

use super::AdminPath;
use crate::runtime::StackFile;

/// Identity and port assigned, workspace created.
/// Available actions: `launch()`
#[derive(Debug, Clone, Copy, Default)]
pub struct Allocated;

/// Stack definition written and brought up.
/// Available actions: `await_database()`
#[derive(Debug, Clone)]
pub struct Launched {
    pub stack: StackFile,
}

/// Database container reported healthy.
/// Available actions: `await_application()`
#[derive(Debug, Clone, Copy, Default)]
pub struct DatabaseReady;

/// Storefront answered.
/// Available actions: `finalize()`
#[derive(Debug, Clone, Copy, Default)]
pub struct ApplicationReady;

/// Storefront still starting when its polling budget ran out.
/// Available actions: `into_report()`
#[derive(Debug, Clone, Copy)]
pub struct ApplicationPending {
    pub attempts: u32,
}

/// Admin folder resolved.
/// Available actions: `into_report()`
#[derive(Debug, Clone)]
pub struct Finalized {
    pub admin: AdminPath,
}
