//! Operator command surface — maps text commands to engine and catalog
//! operations. Every command returns a human-readable reply; validation
//! errors surface immediately with the offending input.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::RwLock;

use herald_broadcast::BroadcastEngine;
use herald_broadcast::trigger::format_schedule;
use herald_catalog::{Catalog, CatalogStore};
use herald_channels::OneBotChannel;
use herald_core::types::{PayloadId, RecipientId};
use herald_core::HeraldConfig;

pub struct CommandHandler {
    engine: Arc<BroadcastEngine>,
    catalog: Arc<RwLock<Catalog>>,
    store: CatalogStore,
    excluded: Arc<RwLock<HashSet<RecipientId>>>,
    channel: Arc<OneBotChannel>,
    config: std::sync::Mutex<HeraldConfig>,
    config_path: PathBuf,
}

impl CommandHandler {
    pub fn new(
        engine: Arc<BroadcastEngine>,
        catalog: Arc<RwLock<Catalog>>,
        store: CatalogStore,
        excluded: Arc<RwLock<HashSet<RecipientId>>>,
        channel: Arc<OneBotChannel>,
        config: HeraldConfig,
        config_path: PathBuf,
    ) -> Self {
        Self {
            engine,
            catalog,
            store,
            excluded,
            channel,
            config: std::sync::Mutex::new(config),
            config_path,
        }
    }

    /// Handle one command line and produce the reply.
    pub async fn handle(&self, line: &str) -> String {
        let (command, rest) = match line.split_once(char::is_whitespace) {
            Some((c, r)) => (c, r.trim()),
            None => (line, ""),
        };

        match command {
            "schedule" => self.schedule(rest).await,
            "stop" => self.stop().await,
            "add" => self.add(rest).await,
            "remove" => self.remove(rest).await,
            "list" => self.list().await,
            "groups" => self.groups().await,
            "enable" => self.toggle(rest, false).await,
            "disable" => self.toggle(rest, true).await,
            "broadcast" => self.broadcast().await,
            "help" => help_text(),
            _ => format!("Unknown command: {command} (try 'help')"),
        }
    }

    async fn schedule(&self, spec: &str) -> String {
        if spec.is_empty() {
            let times = self.engine.schedule().await;
            return if times.is_empty() {
                "No broadcast times set. Usage: schedule 09:00,14:30".into()
            } else {
                format!("Broadcast times: {}", format_schedule(&times))
            };
        }
        let spec = if spec == "clear" { "" } else { spec };
        match self.engine.set_triggers(spec).await {
            Ok(times) if times.is_empty() => "Scheduled broadcasts cleared".into(),
            Ok(times) => format!("Broadcast times set: {}", format_schedule(&times)),
            Err(e) => format!("{e} (expected HH:MM, e.g. 09:00)"),
        }
    }

    async fn stop(&self) -> String {
        if self.engine.stop().await {
            "Scheduled broadcasts stopped".into()
        } else {
            "No scheduled broadcast is running".into()
        }
    }

    async fn add(&self, content: &str) -> String {
        if content.is_empty() {
            return "Usage: add <message content>".into();
        }
        let mut catalog = self.catalog.write().await;
        let id = catalog.add(content);
        if let Err(e) = self.store.save(&catalog) {
            tracing::warn!("Failed to save catalog: {e}");
        }
        format!("Payload added with id {id}")
    }

    async fn remove(&self, arg: &str) -> String {
        let Ok(id) = arg.parse::<PayloadId>() else {
            return format!("Not a payload id: {arg}");
        };
        let mut catalog = self.catalog.write().await;
        if catalog.remove(id) {
            if let Err(e) = self.store.save(&catalog) {
                tracing::warn!("Failed to save catalog: {e}");
            }
            format!("Removed payload {id}")
        } else {
            format!("No payload with id {id}")
        }
    }

    async fn list(&self) -> String {
        let catalog = self.catalog.read().await;
        if catalog.is_empty() {
            return "Catalog is empty".into();
        }
        let mut out = vec![format!("{} payload(s):", catalog.len())];
        for p in catalog.payloads() {
            out.push(format!(
                "  id {} (created {})",
                p.id,
                p.created_at.format("%Y-%m-%d %H:%M:%S")
            ));
        }
        out.join("\n")
    }

    async fn groups(&self) -> String {
        let groups = match self.channel.group_list().await {
            Ok(groups) => groups,
            Err(e) => return format!("Failed to list groups: {e}"),
        };
        let excluded = self.excluded.read().await;
        let mut enabled = Vec::new();
        let mut disabled = Vec::new();
        for (idx, group) in groups.iter().enumerate() {
            let entry = format!("  {}: {} ({})", idx + 1, group.group_name, group.group_id);
            if excluded.contains(&RecipientId::new(group.group_id.to_string())) {
                disabled.push(entry);
            } else {
                enabled.push(entry);
            }
        }
        let mut out = vec![format!("Receiving broadcasts ({}):", enabled.len())];
        out.extend(enabled);
        out.push(format!("Excluded ({}):", disabled.len()));
        out.extend(disabled);
        out.join("\n")
    }

    async fn toggle(&self, group: &str, exclude: bool) -> String {
        if group.is_empty() {
            return format!("Usage: {} <group id>", if exclude { "disable" } else { "enable" });
        }
        let id = RecipientId::from(group);
        let changed = {
            let mut excluded = self.excluded.write().await;
            if exclude {
                excluded.insert(id.clone())
            } else {
                excluded.remove(&id)
            }
        };
        if changed {
            self.persist_exclusions().await;
        }
        match (exclude, changed) {
            (true, true) => format!("Group {group} will no longer receive broadcasts"),
            (true, false) => format!("Group {group} is already excluded"),
            (false, true) => format!("Group {group} will receive broadcasts again"),
            (false, false) => format!("Group {group} already receives broadcasts"),
        }
    }

    async fn broadcast(&self) -> String {
        match self.engine.broadcast_once().await {
            Ok(outcome) => format!("Broadcast complete: {outcome}"),
            Err(e) => format!("Broadcast failed: {e}"),
        }
    }

    /// Mirror the in-memory exclusion set into the config file.
    async fn persist_exclusions(&self) {
        let mut ids: Vec<String> = self
            .excluded
            .read()
            .await
            .iter()
            .map(|r| r.as_str().to_string())
            .collect();
        ids.sort();

        let snapshot = {
            let mut config = self.config.lock().unwrap();
            config.broadcast.disabled_groups = ids;
            config.clone()
        };
        if let Err(e) = snapshot.save_to(&self.config_path) {
            tracing::warn!("Failed to save config: {e}");
        }
    }
}

fn help_text() -> String {
    [
        "Commands:",
        "  schedule HH:MM[,HH:MM...]  set broadcast times (atomic; bad token rejects all)",
        "  schedule                   show current broadcast times",
        "  schedule clear             clear times and stop the loop",
        "  stop                       stop scheduled broadcasts",
        "  add <content>              add a payload to the catalog",
        "  remove <id>                delete a payload",
        "  list                       list payloads",
        "  groups                     list groups, split by broadcast opt-out",
        "  enable <group>             let a group receive broadcasts",
        "  disable <group>            exclude a group from broadcasts",
        "  broadcast                  run one dispatch cycle now",
        "  quit                       exit",
    ]
    .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use herald_core::config::OneBotConfig;
    use herald_core::traits::Transport;

    fn handler(tag: &str) -> (CommandHandler, PathBuf) {
        let dir = std::env::temp_dir().join(format!("herald-test-cmd-{tag}"));
        std::fs::remove_dir_all(&dir).ok();
        let store = CatalogStore::new(&dir);
        let catalog = Arc::new(RwLock::new(store.load()));
        let excluded = Arc::new(RwLock::new(HashSet::new()));
        let channel = Arc::new(OneBotChannel::new(OneBotConfig::default()));
        let transport: Arc<dyn Transport> = channel.clone();
        let engine = Arc::new(BroadcastEngine::new(
            transport,
            catalog.clone(),
            excluded.clone(),
            0..=0,
        ));
        let config_path = dir.join("config.toml");
        let handler = CommandHandler::new(
            engine,
            catalog,
            store,
            excluded,
            channel,
            HeraldConfig::default(),
            config_path,
        );
        (handler, dir)
    }

    #[tokio::test]
    async fn test_catalog_commands() {
        let (handler, dir) = handler("catalog");
        assert_eq!(handler.handle("add hello world").await, "Payload added with id 1");
        assert!(handler.handle("list").await.contains("id 1"));
        assert_eq!(handler.handle("remove 1").await, "Removed payload 1");
        assert_eq!(handler.handle("remove 1").await, "No payload with id 1");
        assert_eq!(handler.handle("remove x").await, "Not a payload id: x");
        assert_eq!(handler.handle("list").await, "Catalog is empty");
        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn test_schedule_commands() {
        let (handler, dir) = handler("schedule");
        assert!(handler.handle("schedule").await.contains("No broadcast times"));
        assert_eq!(
            handler.handle("schedule 14:30,09:00").await,
            "Broadcast times set: 09:00, 14:30"
        );
        // Malformed batch is rejected whole; previous schedule stays.
        assert!(handler.handle("schedule 08:00,25:61").await.contains("25:61"));
        assert_eq!(
            handler.handle("schedule").await,
            "Broadcast times: 09:00, 14:30"
        );
        assert_eq!(handler.handle("stop").await, "Scheduled broadcasts stopped");
        assert_eq!(handler.handle("stop").await, "No scheduled broadcast is running");
        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn test_toggle_commands_persist() {
        let (handler, dir) = handler("toggle");
        assert_eq!(
            handler.handle("disable 123").await,
            "Group 123 will no longer receive broadcasts"
        );
        assert_eq!(handler.handle("disable 123").await, "Group 123 is already excluded");
        let saved = HeraldConfig::load_from(&dir.join("config.toml")).unwrap();
        assert_eq!(saved.broadcast.disabled_groups, vec!["123".to_string()]);

        assert_eq!(
            handler.handle("enable 123").await,
            "Group 123 will receive broadcasts again"
        );
        assert_eq!(
            handler.handle("enable 123").await,
            "Group 123 already receives broadcasts"
        );
        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn test_unknown_command() {
        let (handler, dir) = handler("unknown");
        assert!(handler.handle("bogus").await.contains("Unknown command"));
        std::fs::remove_dir_all(&dir).ok();
    }
}
