#![allow(dead_code)]

use std::collections::VecDeque;
use std::fs;
use std::process::{Command, Output};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use tempfile::TempDir;

use inventory_client::error::{InventoryError, Result};
use inventory_client::query::QueryState;
use inventory_client::remote::{InMemoryGateway, InventoryGateway};
use inventory_client::types::{InventoryItem, ItemId, Page};

pub fn inventory_binary() -> &'static str {
    env!("CARGO_BIN_EXE_inventory")
}

/// Helper struct to run inventory commands in an isolated temp directory
pub struct InventoryTest {
    pub temp_dir: TempDir,
}

impl InventoryTest {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        InventoryTest { temp_dir }
    }

    pub fn command(&self, args: &[&str]) -> Command {
        let mut command = Command::new(inventory_binary());
        command
            .args(args)
            .current_dir(self.temp_dir.path())
            .env_remove("INVENTORY_CONFIG")
            .env_remove("INVENTORY_API_URL")
            .env_remove("INVENTORY_API_TOKEN")
            .env_remove("INVENTORY_LOG")
            .env("NO_COLOR", "1");
        command
    }

    pub fn run(&self, args: &[&str]) -> Output {
        self.command(args)
            .output()
            .expect("Failed to execute inventory command")
    }

    pub fn run_success(&self, args: &[&str]) -> String {
        let output = self.run(args);
        if !output.status.success() {
            panic!(
                "Command {:?} failed with status {:?}\nstdout: {}\nstderr: {}",
                args,
                output.status,
                String::from_utf8_lossy(&output.stdout),
                String::from_utf8_lossy(&output.stderr)
            );
        }
        String::from_utf8_lossy(&output.stdout).to_string()
    }

    pub fn run_failure(&self, args: &[&str]) -> String {
        let output = self.run(args);
        assert!(
            !output.status.success(),
            "Expected command {:?} to fail, but it succeeded",
            args
        );
        String::from_utf8_lossy(&output.stderr).to_string()
    }

    pub fn run_json(&self, args: &[&str]) -> serde_json::Value {
        let stdout = self.run_success(args);
        serde_json::from_str(&stdout).expect("Command output should be valid JSON")
    }

    pub fn write_config(&self, content: &str) {
        let dir = self.temp_dir.path().join(".inventory");
        fs::create_dir_all(&dir).expect("Failed to create .inventory directory");
        fs::write(dir.join("config.yaml"), content).expect("Failed to write config file");
    }

    pub fn read_config(&self) -> Option<String> {
        fs::read_to_string(self.temp_dir.path().join(".inventory").join("config.yaml")).ok()
    }
}

/// Scripted behaviour for one `list` call
#[derive(Debug, Clone, Copy, Default)]
pub struct ListStep {
    pub delay: Duration,
    pub fail: bool,
}

impl ListStep {
    pub fn delayed(millis: u64) -> Self {
        ListStep {
            delay: Duration::from_millis(millis),
            fail: false,
        }
    }

    pub fn failing() -> Self {
        ListStep {
            delay: Duration::ZERO,
            fail: true,
        }
    }
}

/// Wraps the in-memory backend, recording every list query and allowing
/// per-call delays and failures.
#[derive(Default)]
pub struct RecordingGateway {
    pub inner: InMemoryGateway,
    list_queries: Mutex<Vec<QueryState>>,
    list_script: Mutex<VecDeque<ListStep>>,
    mutation_delay: Mutex<Duration>,
    update_calls: AtomicUsize,
    delete_calls: AtomicUsize,
}

impl RecordingGateway {
    pub fn new(inner: InMemoryGateway) -> Self {
        RecordingGateway {
            inner,
            ..RecordingGateway::default()
        }
    }

    pub fn sample() -> Self {
        Self::new(InMemoryGateway::sample())
    }

    /// Behaviour for the next list calls, consumed in order
    pub fn script_lists(&self, steps: impl IntoIterator<Item = ListStep>) {
        self.list_script.lock().extend(steps);
    }

    pub fn set_mutation_delay(&self, millis: u64) {
        *self.mutation_delay.lock() = Duration::from_millis(millis);
    }

    pub fn list_calls(&self) -> usize {
        self.list_queries.lock().len()
    }

    pub fn list_queries(&self) -> Vec<QueryState> {
        self.list_queries.lock().clone()
    }

    pub fn update_calls(&self) -> usize {
        self.update_calls.load(Ordering::SeqCst)
    }

    pub fn delete_calls(&self) -> usize {
        self.delete_calls.load(Ordering::SeqCst)
    }

    async fn mutation_latency(&self) {
        let delay = *self.mutation_delay.lock();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

impl InventoryGateway for RecordingGateway {
    async fn list(&self, query: &QueryState) -> Result<Page> {
        self.list_queries.lock().push(query.clone());
        let step = self.list_script.lock().pop_front().unwrap_or_default();
        if !step.delay.is_zero() {
            tokio::time::sleep(step.delay).await;
        }
        if step.fail {
            return Err(InventoryError::Transport("connection refused".to_string()));
        }
        self.inner.list(query).await
    }

    async fn get(&self, id: ItemId) -> Result<InventoryItem> {
        self.inner.get(id).await
    }

    async fn create(&self, item: &InventoryItem) -> Result<InventoryItem> {
        self.mutation_latency().await;
        self.inner.create(item).await
    }

    async fn update(&self, id: ItemId, item: &InventoryItem) -> Result<InventoryItem> {
        self.update_calls.fetch_add(1, Ordering::SeqCst);
        self.mutation_latency().await;
        self.inner.update(id, item).await
    }

    async fn delete(&self, id: ItemId) -> Result<()> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        self.mutation_latency().await;
        self.inner.delete(id).await
    }
}

pub fn item(id: i64, name: &str) -> InventoryItem {
    InventoryItem::new(name, format!("SKU-{id}"), 1, 10.0, "Books").with_id(ItemId(id))
}

pub fn names(items: &[InventoryItem]) -> Vec<&str> {
    items.iter().map(|i| i.name.as_str()).collect()
}

pub fn ids(items: &[InventoryItem]) -> Vec<i64> {
    items.iter().filter_map(|i| i.id).map(ItemId::get).collect()
}
