//! Tests for the cachet server and plugin lifecycle.

use std::sync::Arc;

use parking_lot::Mutex;

use cachet_system::plugin::{Plugin, PluginGroup, PluginGroupBuilder};
use cachet_system::prelude::*;

// ─────────────────────────────────────────────────────────────────────────
// Test Resources
// ─────────────────────────────────────────────────────────────────────────

#[derive(Debug, PartialEq)]
struct TtlMillis(i64);
impl GlobalResource for TtlMillis {}

#[derive(Debug, PartialEq)]
struct Locale(String);
impl GlobalResource for Locale {}

/// Records lifecycle calls across plugins.
#[derive(Clone, Default)]
struct Journal(Arc<Mutex<Vec<String>>>);

impl Journal {
    fn push(&self, entry: impl Into<String>) {
        self.0.lock().push(entry.into());
    }

    fn entries(&self) -> Vec<String> {
        self.0.lock().clone()
    }
}

// ─────────────────────────────────────────────────────────────────────────
// Test Plugins
// ─────────────────────────────────────────────────────────────────────────

struct BasePlugin;
impl Plugin for BasePlugin {
    fn build(&self, server: &mut Server) {
        server.insert_global(TtlMillis(1));
    }
}

struct ScalePlugin;
impl Plugin for ScalePlugin {
    fn build(&self, server: &mut Server) {
        if let Some(mut ttl) = server.get_global_mut::<TtlMillis>() {
            ttl.0 += 9;
        }
    }

    fn dependencies(&self) -> Vec<PluginId> {
        vec![PluginId::of::<BasePlugin>()]
    }
}

struct DoublePlugin;
impl Plugin for DoublePlugin {
    fn build(&self, server: &mut Server) {
        if let Some(mut ttl) = server.get_global_mut::<TtlMillis>() {
            ttl.0 *= 2;
        }
    }

    fn dependencies(&self) -> Vec<PluginId> {
        vec![PluginId::of::<ScalePlugin>()]
    }
}

struct TracedPlugin<const N: usize> {
    journal: Journal,
}

impl<const N: usize> Plugin for TracedPlugin<N> {
    fn build(&self, _server: &mut Server) {
        self.journal.push(format!("build {N}"));
    }

    fn ready(&self, _server: &mut Server) {
        self.journal.push(format!("ready {N}"));
    }

    fn cleanup(&self, _server: &mut Server) {
        self.journal.push(format!("cleanup {N}"));
    }

    fn dependencies(&self) -> Vec<PluginId> {
        if N == 0 {
            Vec::new()
        } else {
            vec![PluginId::of::<TracedPlugin<0>>()]
        }
    }
}

struct LocalePlugin;
impl Plugin for LocalePlugin {
    fn build(&self, server: &mut Server) {
        server.insert_global(Locale("en".into()));
    }

    fn cleanup(&self, server: &mut Server) {
        server.remove_global::<Locale>();
    }
}

// ─────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────

#[test]
fn server_new_is_empty() {
    let server = Server::new();
    assert!(!server.contains_global::<TtlMillis>());
    assert!(!server.is_built());
    assert!(server.global_resources().is_empty());
}

#[test]
fn plugins_build_in_dependency_order() {
    let mut server = Server::new();
    server.add_plugins(DoublePlugin);
    server.add_plugins(BasePlugin);
    server.add_plugins(ScalePlugin);
    server.finish();

    // Base sets 1, Scale adds 9, Double multiplies by 2
    assert_eq!(server.get_global::<TtlMillis>().unwrap().0, 20);
}

#[test]
fn lifecycle_runs_build_ready_then_cleanup_in_reverse() {
    let journal = Journal::default();

    let mut server = Server::new();
    server.add_plugins(TracedPlugin::<1> {
        journal: journal.clone(),
    });
    server.add_plugins(TracedPlugin::<0> {
        journal: journal.clone(),
    });
    server.finish();
    assert!(server.is_built());

    server.cleanup();
    assert!(server.is_shut_down());

    assert_eq!(
        journal.entries(),
        vec![
            "build 0",
            "build 1",
            "ready 0",
            "ready 1",
            "cleanup 1",
            "cleanup 0"
        ]
    );
}

#[test]
fn cleanup_is_idempotent() {
    let journal = Journal::default();

    let mut server = Server::new();
    server.add_plugins(TracedPlugin::<0> {
        journal: journal.clone(),
    });

    // Before finish: nothing to tear down
    server.cleanup();
    assert!(journal.entries().is_empty());

    server.finish();
    server.cleanup();
    server.cleanup();

    assert_eq!(
        journal.entries().iter().filter(|e| e.starts_with("cleanup")).count(),
        1
    );
}

#[test]
fn cleanup_can_remove_globals() {
    let mut server = Server::new();
    server.add_plugins(LocalePlugin);
    server.finish();
    assert_eq!(server.get_global::<Locale>().unwrap().0, "en");

    server.cleanup();
    assert!(!server.contains_global::<Locale>());
}

#[test]
fn has_plugin_returns_true_for_added() {
    let mut server = Server::new();
    server.add_plugins(BasePlugin);

    assert!(server.has_plugin::<BasePlugin>());
    assert!(!server.has_plugin::<ScalePlugin>());
}

#[test]
#[should_panic(expected = "already added")]
fn duplicate_unique_plugin_panics() {
    let mut server = Server::new();
    server.add_plugins(BasePlugin);
    server.add_plugins(BasePlugin);
}

#[test]
#[should_panic(expected = "requires")]
fn missing_dependency_panics() {
    let mut server = Server::new();
    server.add_plugins(ScalePlugin);
    server.finish();
}

#[test]
#[should_panic(expected = "Circular dependency")]
fn circular_dependency_panics() {
    struct Left;
    impl Plugin for Left {
        fn build(&self, _server: &mut Server) {}
        fn dependencies(&self) -> Vec<PluginId> {
            vec![PluginId::of::<Right>()]
        }
    }

    struct Right;
    impl Plugin for Right {
        fn build(&self, _server: &mut Server) {}
        fn dependencies(&self) -> Vec<PluginId> {
            vec![PluginId::of::<Left>()]
        }
    }

    let mut server = Server::new();
    server.add_plugins(Left);
    server.add_plugins(Right);
    server.finish();
}

#[test]
#[should_panic(expected = "already called")]
fn double_finish_panics() {
    let mut server = Server::new();
    server.finish();
    server.finish();
}

#[test]
fn sub_plugin_added_during_build() {
    struct Parent;
    impl Plugin for Parent {
        fn build(&self, server: &mut Server) {
            server.add_plugins(LocalePlugin);
        }
    }

    let mut server = Server::new();
    server.add_plugins(Parent);
    server.finish();

    assert!(server.has_plugin::<LocalePlugin>());
    assert!(server.contains_global::<Locale>());
}

struct StorefrontPlugins;

impl PluginGroup for StorefrontPlugins {
    fn build(self) -> PluginGroupBuilder {
        PluginGroupBuilder::new()
            .add(BasePlugin)
            .add(ScalePlugin)
            .add(LocalePlugin)
    }
}

#[test]
fn plugin_group_adds_all_plugins() {
    let mut server = Server::new();
    server.add_plugins(StorefrontPlugins.build().disable::<ScalePlugin>());
    server.finish();

    assert!(server.has_plugin::<BasePlugin>());
    assert!(!server.has_plugin::<ScalePlugin>());
    assert_eq!(server.get_global::<TtlMillis>().unwrap().0, 1);
    assert!(server.contains_global::<Locale>());
}
