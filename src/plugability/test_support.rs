//! Helpers for plugin tests

use std::sync::Arc;

use super::plugin::{Plugin, PluginDeclarer};
use crate::types::Result;

/// Plugin whose declaration is a closure
pub(crate) struct FnPlugin<F> {
    name: &'static str,
    declare: F,
}

impl<F> Plugin for FnPlugin<F>
where
    F: Fn(&mut PluginDeclarer) + Send + Sync,
{
    fn name(&self) -> &str {
        self.name
    }

    fn declare(&self, declarer: &mut PluginDeclarer) -> Result<()> {
        (self.declare)(declarer);
        Ok(())
    }
}

pub(crate) fn plugin<F>(name: &'static str, declare: F) -> Arc<dyn Plugin>
where
    F: Fn(&mut PluginDeclarer) + Send + Sync + 'static,
{
    Arc::new(FnPlugin { name, declare })
}
