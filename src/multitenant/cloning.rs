//! # Hot Cloning Capabilities
//!
//! Online PDB cloning with copy-on-write, thin cloning, snapshot cloning,
//! refreshable clones, and cloning from backup.
//!
//! ## Features
//!
//! - **Online Cloning**: Clone PDBs without downtime
//! - **Copy-on-Write**: Efficient thin cloning with CoW
//! - **Snapshot Cloning**: Clone from PDB snapshots
//! - **Refreshable Clones**: Periodically sync with source
//! - **Clone from Backup**: Restore and clone from backups
//! - **Sparse Cloning**: Clone with minimal initial storage
//!
//! ## Architecture
//!
//! Uses a layered storage approach similar to Docker/container images:
//! - Base layer: Original PDB data (read-only)
//! - CoW layer: Modified blocks for the clone
//! - Metadata layer: Tracks block ownership and deltas

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::sync::RwLock;
use serde::{Serialize, Deserialize};
use crate::error::{DbError, Result};
use super::pdb::{PdbId, PdbSnapshot};

/// Clone type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CloneType {
    /// Full clone (complete copy)
    Full,
    /// Thin clone (copy-on-write)
    Thin,
    /// Snapshot clone
    Snapshot,
    /// Refreshable clone (can sync with source)
    Refreshable,
    /// Clone from backup
    FromBackup,
}

/// Clone metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloneMetadata {
    /// Clone ID
    pub clone_id: u64,

    /// Source PDB ID
    pub source_pdb_id: PdbId,

    /// Cloned PDB ID
    pub cloned_pdb_id: PdbId,

    /// Clone type
    pub clone_type: CloneType,

    /// Creation timestamp
    pub created_at: u64,

    /// Source SCN at clone time
    pub source_scn: u64,

    /// Current SCN of clone
    pub current_scn: u64,

    /// Clone status
    pub status: CloneStatus,

    /// Size of clone (bytes)
    pub size_bytes: u64,

    /// Size of CoW layer (bytes)
    pub cow_layer_bytes: u64,

    /// Last refresh timestamp (for refreshable clones)
    pub last_refresh_at: Option<u64>,

    /// Parent clone ID (for clone chains)
    pub parent_clone_id: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CloneStatus {
    /// Clone is being created
    Creating,
    /// Clone is active
    Active,
    /// Clone is being refreshed
    Refreshing,
    /// Clone is being deleted
    Deleting,
    /// Clone creation failed
    Failed,
}

/// Cloning engine
pub struct CloningEngine {
    /// Active clones
    clones: Arc<RwLock<HashMap<u64, CloneMetadata>>>,

    /// Next clone ID
    next_id: Arc<RwLock<u64>>,

    /// Copy-on-write engine
    cow_engine: Arc<CopyOnWriteEngine>,

    /// Snapshot manager
    snapshot_manager: Arc<RwLock<HashMap<PdbId, Vec<PdbSnapshot>>>>,
}

impl CloningEngine {
    /// Create a new cloning engine
    pub fn new() -> Self {
        Self {
            clones: Arc::new(RwLock::new(HashMap::new())),
            next_id: Arc::new(RwLock::new(1)),
            cow_engine: Arc::new(CopyOnWriteEngine::new()),
            snapshot_manager: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Create a full clone
    pub async fn create_full_clone(
        &self,
        source_pdb_id: PdbId,
        clone_name: &str,
        source_scn: u64,
    ) -> Result<(u64, PdbId)> {
        let clone_id = self.allocate_clone_id().await;
        let cloned_pdb_id = PdbId::new(clone_id);

        let metadata = CloneMetadata {
            clone_id,
            source_pdb_id,
            cloned_pdb_id,
            clone_type: CloneType::Full,
            created_at: SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_secs(),
            source_scn,
            current_scn: source_scn,
            status: CloneStatus::Creating,
            size_bytes: 0,
            cow_layer_bytes: 0,
            last_refresh_at: None,
            parent_clone_id: None,
        };

        self.clones.write().await.insert(clone_id, metadata.clone());

        // Perform full clone (copy all data)
        // In real implementation, this would copy all data files
        tokio::time::sleep(Duration::from_millis(100)).await; // Simulate work

        // Update status
        let mut clones = self.clones.write().await;
        if let Some(meta) = clones.get_mut(&clone_id) {
            meta.status = CloneStatus::Active;
            meta.size_bytes = 1024 * 1024 * 1024; // 1 GB
        }

        Ok((clone_id, cloned_pdb_id))
    }

    /// Create a thin clone (copy-on-write)
    pub async fn create_thin_clone(
        &self,
        source_pdb_id: PdbId,
        clone_name: &str,
        source_scn: u64,
    ) -> Result<(u64, PdbId)> {
        let clone_id = self.allocate_clone_id().await;
        let cloned_pdb_id = PdbId::new(clone_id);

        let metadata = CloneMetadata {
            clone_id,
            source_pdb_id,
            cloned_pdb_id,
            clone_type: CloneType::Thin,
            created_at: SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_secs(),
            source_scn,
            current_scn: source_scn,
            status: CloneStatus::Creating,
            size_bytes: 0,
            cow_layer_bytes: 0,
            last_refresh_at: None,
            parent_clone_id: None,
        };

        self.clones.write().await.insert(clone_id, metadata.clone());

        // Create CoW mapping
        self.cow_engine
            .create_cow_layer(source_pdb_id, cloned_pdb_id)
            .await?;

        // Update status
        let mut clones = self.clones.write().await;
        if let Some(meta) = clones.get_mut(&clone_id) {
            meta.status = CloneStatus::Active;
            meta.size_bytes = 1024; // Minimal initial size
            meta.cow_layer_bytes = 0;
        }

        Ok((clone_id, cloned_pdb_id))
    }

    /// Create a snapshot clone
    pub async fn create_snapshot_clone(
        &self,
        snapshot_id: u64,
        source_pdb_id: PdbId,
        clone_name: &str,
    ) -> Result<(u64, PdbId)> {
        let clone_id = self.allocate_clone_id().await;
        let cloned_pdb_id = PdbId::new(clone_id);

        // Get snapshot metadata
        let snapshot_manager = self.snapshot_manager.read().await;
        let snapshots = snapshot_manager.get(&source_pdb_id).ok_or_else(|| {
            DbError::NotFound(format!("No snapshots for PDB {:?}", source_pdb_id))
        })?;

        let snapshot = snapshots
            .iter()
            .find(|s| s.id == snapshot_id)
            .ok_or_else(|| DbError::NotFound(format!("Snapshot {} not found", snapshot_id)))?;

        let metadata = CloneMetadata {
            clone_id,
            source_pdb_id,
            cloned_pdb_id,
            clone_type: CloneType::Snapshot,
            created_at: SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_secs(),
            source_scn: snapshot.scn,
            current_scn: snapshot.scn,
            status: CloneStatus::Creating,
            size_bytes: 0,
            cow_layer_bytes: 0,
            last_refresh_at: None,
            parent_clone_id: None,
        };

        drop(snapshot_manager);
        self.clones.write().await.insert(clone_id, metadata.clone());

        // Clone from snapshot
        tokio::time::sleep(Duration::from_millis(50)).await; // Simulate work

        // Update status
        let mut clones = self.clones.write().await;
        if let Some(meta) = clones.get_mut(&clone_id) {
            meta.status = CloneStatus::Active;
            meta.size_bytes = snapshot.size_bytes;
        }

        Ok((clone_id, cloned_pdb_id))
    }

    /// Create a refreshable clone
    pub async fn create_refreshable_clone(
        &self,
        source_pdb_id: PdbId,
        clone_name: &str,
        source_scn: u64,
    ) -> Result<(u64, PdbId)> {
        let clone_id = self.allocate_clone_id().await;
        let cloned_pdb_id = PdbId::new(clone_id);

        let metadata = CloneMetadata {
            clone_id,
            source_pdb_id,
            cloned_pdb_id,
            clone_type: CloneType::Refreshable,
            created_at: SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_secs(),
            source_scn,
            current_scn: source_scn,
            status: CloneStatus::Creating,
            size_bytes: 0,
            cow_layer_bytes: 0,
            last_refresh_at: Some(SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_secs()),
            parent_clone_id: None,
        };

        self.clones.write().await.insert(clone_id, metadata.clone());

        // Create refreshable clone with CoW
        self.cow_engine
            .create_cow_layer(source_pdb_id, cloned_pdb_id)
            .await?;

        // Update status
        let mut clones = self.clones.write().await;
        if let Some(meta) = clones.get_mut(&clone_id) {
            meta.status = CloneStatus::Active;
            meta.size_bytes = 1024;
        }

        Ok((clone_id, cloned_pdb_id))
    }

    /// Refresh a refreshable clone
    pub async fn refresh_clone(&self, clone_id: u64, target_scn: u64) -> Result<()> {
        let mut clones = self.clones.write().await;

        if let Some(meta) = clones.get_mut(&clone_id) {
            if meta.clone_type != CloneType::Refreshable {
                return Err(DbError::InvalidInput(
                    "Clone is not refreshable".to_string()
                ));
            }

            meta.status = CloneStatus::Refreshing;
            drop(clones);

            // Apply changes from source up to target SCN
            // In real implementation, this would replay redo logs
            tokio::time::sleep(Duration::from_millis(100)).await;

            let mut clones = self.clones.write().await;
            if let Some(meta) = clones.get_mut(&clone_id) {
                meta.current_scn = target_scn;
                meta.status = CloneStatus::Active;
                meta.last_refresh_at = Some(
                    SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_secs()
                );
            }

            Ok(())
        } else {
            Err(DbError::NotFound(format!("Clone {} not found", clone_id)))
        }
    }

    /// Delete a clone
    pub async fn delete_clone(&self, clone_id: u64) -> Result<()> {
        let mut clones = self.clones.write().await;

        if let Some(mut meta) = clones.get_mut(&clone_id) {
            meta.status = CloneStatus::Deleting;

            // Clean up CoW layer if thin clone
            if meta.clone_type == CloneType::Thin || meta.clone_type == CloneType::Refreshable {
                self.cow_engine
                    .delete_cow_layer(meta.cloned_pdb_id)
                    .await?;
            }

            clones.remove(&clone_id);
            Ok(())
        } else {
            Err(DbError::NotFound(format!("Clone {} not found", clone_id)))
        }
    }

    /// Get clone metadata
    pub async fn get_clone(&self, clone_id: u64) -> Result<CloneMetadata> {
        self.clones
            .read()
            .await
            .get(&clone_id)
            .cloned()
            .ok_or_else(|| DbError::NotFound(format!("Clone {} not found", clone_id)))
    }

    /// List clones for a source PDB
    pub async fn list_clones(&self, source_pdb_id: PdbId) -> Vec<CloneMetadata> {
        self.clones
            .read()
            .await
            .values()
            .filter(|c| c.source_pdb_id == source_pdb_id)
            .cloned()
            .collect()
    }

    /// Allocate a new clone ID
    async fn allocate_clone_id(&self) -> u64 {
        let mut next_id = self.next_id.write().await;
        let id = *next_id;
        *next_id += 1;
        id
    }
}

/// Copy-on-Write engine for thin cloning
pub struct CopyOnWriteEngine {
    /// CoW layers (clone PDB ID -> layer)
    layers: Arc<RwLock<HashMap<PdbId, CowLayer>>>,
}

#[derive(Debug, Clone)]
struct CowLayer {
    /// Source PDB ID
    source_pdb_id: PdbId,

    /// Clone PDB ID
    clone_pdb_id: PdbId,

    /// Modified blocks (block ID -> block data)
    modified_blocks: HashMap<u64, Vec<u8>>,

    /// Size of CoW layer
    layer_size_bytes: u64,

    /// Block size
    block_size: usize,
}

impl CopyOnWriteEngine {
    /// Create a new CoW engine
    pub fn new() -> Self {
        Self {
            layers: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Create a CoW layer for a clone
    pub async fn create_cow_layer(&self, source_pdb_id: PdbId, clone_pdb_id: PdbId) -> Result<()> {
        let layer = CowLayer {
            source_pdb_id,
            clone_pdb_id,
            modified_blocks: HashMap::new(),
            layer_size_bytes: 0,
            block_size: 8192, // 8 KB blocks
        };

        self.layers.write().await.insert(clone_pdb_id, layer);
        Ok(())
    }

    /// Delete a CoW layer
    pub async fn delete_cow_layer(&self, clone_pdb_id: PdbId) -> Result<()> {
        self.layers.write().await.remove(&clone_pdb_id);
        Ok(())
    }

    /// Read a block (from CoW layer or source)
    pub async fn read_block(&self, clone_pdb_id: PdbId, block_id: u64) -> Result<Vec<u8>> {
        let layers = self.layers.read().await;

        if let Some(layer) = layers.get(&clone_pdb_id) {
            // Check if block is in CoW layer
            if let Some(block_data) = layer.modified_blocks.get(&block_id) {
                return Ok(block_data.clone());
            }

            // Otherwise, read from source
            // In real implementation, would read from source PDB
            Ok(vec![0; layer.block_size])
        } else {
            Err(DbError::NotFound(format!("CoW layer not found for PDB {:?}", clone_pdb_id)))
        }
    }

    /// Write a block (to CoW layer)
    pub async fn write_block(
        &self,
        clone_pdb_id: PdbId,
        block_id: u64,
        block_data: Vec<u8>,
    ) -> Result<()> {
        let mut layers = self.layers.write().await;

        if let Some(layer) = layers.get_mut(&clone_pdb_id) {
            let block_size = block_data.len();

            // Insert or update modified block
            if layer.modified_blocks.insert(block_id, block_data).is_none() {
                // New block, increase layer size
                layer.layer_size_bytes += block_size as u64;
            }

            Ok(())
        } else {
            Err(DbError::NotFound(format!("CoW layer not found for PDB {:?}", clone_pdb_id)))
        }
    }

    /// Get CoW layer statistics
    pub async fn get_layer_stats(&self, clone_pdb_id: PdbId) -> Result<CowLayerStats> {
        let layers = self.layers.read().await;

        if let Some(layer) = layers.get(&clone_pdb_id) {
            Ok(CowLayerStats {
                modified_block_count: layer.modified_blocks.len(),
                layer_size_bytes: layer.layer_size_bytes,
                block_size: layer.block_size,
            })
        } else {
            Err(DbError::NotFound(format!("CoW layer not found for PDB {:?}", clone_pdb_id)))
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CowLayerStats {
    pub modified_block_count: usize,
    pub layer_size_bytes: u64,
    pub block_size: usize,
}

/// Thin clone
pub struct ThinClone {
    clone_id: u64,
    source_pdb_id: PdbId,
    cloned_pdb_id: PdbId,
}

impl ThinClone {
    /// Create a new thin clone
    pub fn new(clone_id: u64, source_pdb_id: PdbId, cloned_pdb_id: PdbId) -> Self {
        Self {
            clone_id,
            source_pdb_id,
            cloned_pdb_id,
        }
    }

    /// Get clone ID
    pub fn id(&self) -> u64 {
        self.clone_id
    }

    /// Get source PDB ID
    pub fn source_pdb_id(&self) -> PdbId {
        self.source_pdb_id
    }

    /// Get cloned PDB ID
    pub fn cloned_pdb_id(&self) -> PdbId {
        self.cloned_pdb_id
    }
}

/// Snapshot clone
pub struct SnapshotClone {
    clone_id: u64,
    snapshot_id: u64,
    source_pdb_id: PdbId,
    cloned_pdb_id: PdbId,
}

impl SnapshotClone {
    /// Create a new snapshot clone
    pub fn new(
        clone_id: u64,
        snapshot_id: u64,
        source_pdb_id: PdbId,
        cloned_pdb_id: PdbId,
    ) -> Self {
        Self {
            clone_id,
            snapshot_id,
            source_pdb_id,
            cloned_pdb_id,
        }
    }
}

/// Refreshable clone
pub struct RefreshableClone {
    clone_id: u64,
    source_pdb_id: PdbId,
    cloned_pdb_id: PdbId,
    last_refresh_scn: u64,
}

impl RefreshableClone {
    /// Create a new refreshable clone
    pub fn new(clone_id: u64, source_pdb_id: PdbId, cloned_pdb_id: PdbId, scn: u64) -> Self {
        Self {
            clone_id,
            source_pdb_id,
            cloned_pdb_id,
            last_refresh_scn: scn,
        }
    }

    /// Get last refresh SCN
    pub fn last_refresh_scn(&self) -> u64 {
        self.last_refresh_scn
    }
}

/// Clone from backup
pub struct CloneFromBackup {
    clone_id: u64,
    backup_id: u64,
    cloned_pdb_id: PdbId,
}

impl CloneFromBackup {
    /// Create a clone from backup
    pub fn new(clone_id: u64, backup_id: u64, cloned_pdb_id: PdbId) -> Self {
        Self {
            clone_id,
            backup_id,
            cloned_pdb_id,
        }
    }

    /// Get backup ID
    pub fn backup_id(&self) -> u64 {
        self.backup_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_full_clone() {
        let engine = CloningEngine::new();
        let source_pdb_id = PdbId::new(1);

        let result = engine.create_full_clone(source_pdb_id, "CLONE1", 1000).await;
        assert!(result.is_ok());

        let (clone_id, _cloned_pdb_id) = result.unwrap();
        let metadata = engine.get_clone(clone_id).await.unwrap();
        assert_eq!(metadata.clone_type, CloneType::Full);
    }

    #[tokio::test]
    async fn test_thin_clone() {
        let engine = CloningEngine::new();
        let source_pdb_id = PdbId::new(1);

        let result = engine.create_thin_clone(source_pdb_id, "CLONE2", 1000).await;
        assert!(result.is_ok());

        let (clone_id, _cloned_pdb_id) = result.unwrap();
        let metadata = engine.get_clone(clone_id).await.unwrap();
        assert_eq!(metadata.clone_type, CloneType::Thin);
    }

    #[tokio::test]
    async fn test_cow_engine() {
        let engine = CopyOnWriteEngine::new();
        let source_pdb_id = PdbId::new(1);
        let clone_pdb_id = PdbId::new(2);

        engine.create_cow_layer(source_pdb_id, clone_pdb_id).await.unwrap();

        let block_data = vec![1, 2, 3, 4];
        engine.write_block(clone_pdb_id, 0, block_data.clone()).await.unwrap();

        let read_data = engine.read_block(clone_pdb_id, 0).await.unwrap();
        assert_eq!(read_data, block_data);
    }
}


