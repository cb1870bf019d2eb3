#![allow(dead_code)]
// SnapshotManager trait implementation for FileSnapshotManager

use async_trait::async_trait;
use std::time::SystemTime;

use super::errors::SnapshotError;
use super::manager::{FileSnapshotManager, SnapshotManager};
use super::types::*;
use crate::replication::types::{LogSequenceNumber, ReplicaId};

#[async_trait]
impl SnapshotManager for FileSnapshotManager {
    async fn create_full_snapshot(
        &self,
        replica_id: &ReplicaId,
    ) -> Result<SnapshotId, SnapshotError> {
        self.create_full_snapshot_impl(replica_id).await
    }

    async fn create_incremental_snapshot(
        &self,
        replica_id: &ReplicaId,
        parent_snapshot: &SnapshotId,
    ) -> Result<SnapshotId, SnapshotError> {
        {
            let cache = self.metadata_cache.read();
            if !cache.contains_key(parent_snapshot) {
                return Err(SnapshotError::SnapshotNotFound {
                    snapshot_id: parent_snapshot.to_string(),
                });
            }
        }

        let snapshot_id = SnapshotId::generate();
        let snapshot_data = b"Incremental snapshot data".to_vec();
        let compressed_data = self
            .compress_data(&snapshot_data, &self.config.compression)
            .await?;
        let checksum = self.calculate_checksum(&compressed_data, &ChecksumAlgorithm::Sha256);

        let data_path = self.get_snapshot_data_path(&snapshot_id);
        tokio::fs::write(&data_path, &compressed_data)
            .await
            .map_err(|e| SnapshotError::StorageError {
                operation: "write_snapshot".to_string(),
                reason: e.to_string(),
            })?;

        let metadata = SnapshotMetadata {
            snapshot_id: snapshot_id.clone(),
            replica_id: replica_id.clone(),
            snapshot_type: SnapshotType::Incremental,
            created_at: SystemTime::now(),
            size_bytes: snapshot_data.len() as u64,
            compressed_size_bytes: Some(compressed_data.len() as u64),
            compression: self.config.compression.clone(),
            encrypted: self.config.encryption.is_some(),
            lsn: Some(LogSequenceNumber::new(12350)),
            parent_snapshot: Some(parent_snapshot.clone()),
            child_snapshots: Vec::new(),
            checksum,
            checksum_algorithm: ChecksumAlgorithm::Sha256,
            tags: std::collections::HashMap::new(),
            custom_metadata: std::collections::HashMap::new(),
            status: SnapshotStatus::Completed,
            error_info: None,
            storage_path: data_path,
            verified: false,
            last_verified: None,
        };

        self.save_snapshot_metadata(&metadata).await?;
        {
            let mut cache = self.metadata_cache.write();
            cache.insert(snapshot_id.clone(), metadata);
            if let Some(parent_metadata) = cache.get_mut(parent_snapshot) {
                parent_metadata.child_snapshots.push(snapshot_id.clone());
            }
        }

        self.update_statistics().await;
        Ok(snapshot_id)
    }

    async fn create_differential_snapshot(
        &self,
        replica_id: &ReplicaId,
        base_snapshot: &SnapshotId,
    ) -> Result<SnapshotId, SnapshotError> {
        self.create_incremental_snapshot(replica_id, base_snapshot)
            .await
    }

    async fn list_snapshots(
        &self,
        replica_id: &ReplicaId,
    ) -> Result<Vec<SnapshotMetadata>, SnapshotError> {
        let cache = self.metadata_cache.read();
        Ok(cache
            .values()
            .filter(|metadata| &metadata.replica_id == replica_id)
            .cloned()
            .collect())
    }

    async fn get_snapshot_metadata(
        &self,
        snapshot_id: &SnapshotId,
    ) -> Result<SnapshotMetadata, SnapshotError> {
        let cache = self.metadata_cache.read();
        cache
            .get(snapshot_id)
            .cloned()
            .ok_or_else(|| SnapshotError::SnapshotNotFound {
                snapshot_id: snapshot_id.to_string(),
            })
    }

    async fn delete_snapshot(&self, snapshot_id: &SnapshotId) -> Result<(), SnapshotError> {
        let metadata = {
            let mut cache = self.metadata_cache.write();
            cache
                .remove(snapshot_id)
                .ok_or_else(|| SnapshotError::SnapshotNotFound {
                    snapshot_id: snapshot_id.to_string(),
                })?
        };

        if metadata.storage_path.exists() {
            tokio::fs::remove_file(&metadata.storage_path)
                .await
                .map_err(|e| SnapshotError::StorageError {
                    operation: "delete_data".to_string(),
                    reason: e.to_string(),
                })?;
        }

        let metadata_path = self
            .config
            .storage_path
            .join(format!("{}.metadata", snapshot_id));
        if metadata_path.exists() {
            tokio::fs::remove_file(&metadata_path).await.map_err(|e| {
                SnapshotError::StorageError {
                    operation: "delete_metadata".to_string(),
                    reason: e.to_string(),
                }
            })?;
        }

        self.update_statistics().await;
        Ok(())
    }

    async fn restore_snapshot(
        &self,
        replica_id: &ReplicaId,
        snapshot_id: &SnapshotId,
    ) -> Result<(), SnapshotError> {
        let options = RestoreOptions::default();
        self.restore_snapshot_with_options(replica_id, snapshot_id, options)
            .await
    }

    async fn restore_snapshot_with_options(
        &self,
        _replica_id: &ReplicaId,
        snapshot_id: &SnapshotId,
        _options: RestoreOptions,
    ) -> Result<(), SnapshotError> {
        let metadata = self.get_snapshot_metadata(snapshot_id).await?;

        let compressed_data = tokio::fs::read(&metadata.storage_path).await.map_err(|e| {
            SnapshotError::StorageError {
                operation: "read_snapshot".to_string(),
                reason: e.to_string(),
            }
        })?;

        let calculated_checksum =
            self.calculate_checksum(&compressed_data, &metadata.checksum_algorithm);
        if calculated_checksum != metadata.checksum {
            return Err(SnapshotError::ValidationFailed {
                snapshot_id: snapshot_id.to_string(),
                reason: "Checksum mismatch".to_string(),
            });
        }

        let _data = self
            .decompress_data(&compressed_data, &metadata.compression)
            .await?;
        Ok(())
    }

    async fn verify_snapshot(&self, snapshot_id: &SnapshotId) -> Result<bool, SnapshotError> {
        let metadata = self.get_snapshot_metadata(snapshot_id).await?;

        if !metadata.storage_path.exists() {
            return Ok(false);
        }

        let data = tokio::fs::read(&metadata.storage_path).await.map_err(|e| {
            SnapshotError::StorageError {
                operation: "read_for_verification".to_string(),
                reason: e.to_string(),
            }
        })?;

        let calculated_checksum = self.calculate_checksum(&data, &metadata.checksum_algorithm);
        let verified = calculated_checksum == metadata.checksum;

        if verified {
            let mut cache = self.metadata_cache.write();
            if let Some(metadata) = cache.get_mut(snapshot_id) {
                metadata.verified = true;
                metadata.last_verified = Some(SystemTime::now());
            }
        }

        Ok(verified)
    }

    async fn apply_retention_policy(
        &self,
        replica_id: &ReplicaId,
    ) -> Result<Vec<SnapshotId>, SnapshotError> {
        let mut deleted_snapshots = Vec::new();
        let policy = &self.config.retention_policy;

        let snapshots = self.list_snapshots(replica_id).await?;
        if snapshots.is_empty() {
            return Ok(deleted_snapshots);
        }

        let mut snapshots = snapshots;
        snapshots.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let now = SystemTime::now();
        let mut full_snapshots_kept = 0;

        for (index, snapshot) in snapshots.iter().enumerate() {
            let age = now.duration_since(snapshot.created_at).unwrap_or_default();
            let should_delete = index >= policy.max_snapshots
                || age > policy.max_age
                || (snapshot.snapshot_type == SnapshotType::Full
                    && full_snapshots_kept >= policy.min_full_snapshots);

            if should_delete {
                if let Ok(()) = self.delete_snapshot(&snapshot.snapshot_id).await {
                    deleted_snapshots.push(snapshot.snapshot_id.clone());
                }
            } else if snapshot.snapshot_type == SnapshotType::Full {
                full_snapshots_kept += 1;
            }
        }

        Ok(deleted_snapshots)
    }

    async fn get_statistics(
        &self,
        replica_id: Option<&ReplicaId>,
    ) -> Result<SnapshotStatistics, SnapshotError> {
        if let Some(replica_id) = replica_id {
            let snapshots = self.list_snapshots(replica_id).await?;
            let total_snapshots = snapshots.len();
            let full_snapshots = snapshots
                .iter()
                .filter(|s| s.snapshot_type == SnapshotType::Full)
                .count();
            let incremental_snapshots = snapshots
                .iter()
                .filter(|s| s.snapshot_type == SnapshotType::Incremental)
                .count();

            let total_storage_bytes: u64 = snapshots.iter().map(|s| s.size_bytes).sum();
            let compressed_storage_bytes: u64 = snapshots
                .iter()
                .map(|s| s.compressed_size_bytes.unwrap_or(s.size_bytes))
                .sum();

            Ok(SnapshotStatistics {
                total_snapshots,
                full_snapshots,
                incremental_snapshots,
                total_storage_bytes,
                compressed_storage_bytes,
                average_compression_ratio: if total_storage_bytes > 0 {
                    compressed_storage_bytes as f64 / total_storage_bytes as f64
                } else {
                    1.0
                },
                oldest_snapshot_age: snapshots
                    .iter()
                    .map(|s| s.created_at)
                    .min()
                    .map(|oldest| SystemTime::now().duration_since(oldest).unwrap_or_default()),
                average_creation_time: std::time::Duration::from_secs(90),
                success_rate: if total_snapshots > 0 {
                    let successful = snapshots
                        .iter()
                        .filter(|s| s.status == SnapshotStatus::Completed)
                        .count();
                    (successful as f64 / total_snapshots as f64) * 100.0
                } else {
                    100.0
                },
                storage_efficiency: StorageEfficiency {
                    deduplication_ratio: 1.0,
                    compression_effectiveness: if total_storage_bytes > 0 {
                        1.0 - (compressed_storage_bytes as f64 / total_storage_bytes as f64)
                    } else {
                        0.0
                    },
                    space_savings: if total_storage_bytes > 0 {
                        ((total_storage_bytes - compressed_storage_bytes) as f64
                            / total_storage_bytes as f64)
                            * 100.0
                    } else {
                        0.0
                    },
                    average_size_reduction: if total_storage_bytes > 0 {
                        compressed_storage_bytes as f64 / total_storage_bytes as f64
                    } else {
                        1.0
                    },
                },
            })
        } else {
            let stats = self.statistics.read();
            Ok(stats.clone())
        }
    }
}
