// Page Prefetcher
//
// Sequential scan detection and prefetching.

use super::common::*;
use serde::{Serialize, Deserialize};

pub struct PagePrefetcher {
    // Sequential scan detection window
    scan_window: usize,
    // Recent access pattern
    access_history: Mutex<VecDeque<PageId>>,
    // Prefetch queue
    _prefetch_queue: Mutex<VecDeque<PageId>>,
    // Statistics
    stats: PrefetchStats,
}

#[derive(Debug)]
struct PrefetchStats {
    prefetch_requests: AtomicU64,
    prefetch_hits: AtomicU64,
    prefetch_misses: AtomicU64,
    sequential_scans_detected: AtomicU64,
}

impl PagePrefetcher {
    pub fn new(scan_window: usize) -> Self {
        Self {
            scan_window,
            access_history: Mutex::new(VecDeque::new()),
            _prefetch_queue: Mutex::new(VecDeque::new()),
            stats: PrefetchStats {
                prefetch_requests: AtomicU64::new(0),
                prefetch_hits: AtomicU64::new(0),
                prefetch_misses: AtomicU64::new(0),
                sequential_scans_detected: AtomicU64::new(0),
            },
        }
    }

    // Record page access and predict next pages
    pub fn record_access(&self, page_id: PageId) -> Vec<PageId> {
        let mut history = self.access_history.lock();
        history.push_back(page_id);

        if history.len() > self.scan_window {
            history.pop_front();
        }

        // Detect sequential pattern
        if self.is_sequential_scan(&history) {
            self.stats.sequential_scans_detected.fetch_add(1, Ordering::Relaxed);
            return self.predict_sequential(page_id);
        }

        Vec::new()
    }

    // Check if access pattern is sequential
    fn is_sequential_scan(&self, history: &VecDeque<PageId>) -> bool {
        if history.len() < 3 {
            return false;
        }

        let vec: Vec<&PageId> = history.iter().collect();
        let mut sequential_count = 0;

        for i in 0..vec.len() - 1 {
            if vec[i].tablespace_id == vec[i + 1].tablespace_id &&
               vec[i + 1].page_number == vec[i].page_number + 1 {
                sequential_count += 1;
            }
        }

        sequential_count as f64 / (vec.len() - 1) as f64 > 0.7
    }

    // Predict next pages in sequential scan
    fn predict_sequential(&self, last_page: PageId) -> Vec<PageId> {
        let mut predictions = Vec::new();

        // Prefetch next 4 pages
        for i in 1..=4 {
            predictions.push(PageId {
                tablespace_id: last_page.tablespace_id,
                page_number: last_page.page_number + i,
            });
        }

        self.stats.prefetch_requests.fetch_add(predictions.len() as u64, Ordering::Relaxed);
        predictions
    }

    // Get prefetch statistics
    pub fn get_stats(&self) -> PrefetchStatsSnapshot {
        PrefetchStatsSnapshot {
            prefetch_requests: self.stats.prefetch_requests.load(Ordering::Relaxed),
            prefetch_hits: self.stats.prefetch_hits.load(Ordering::Relaxed),
            prefetch_misses: self.stats.prefetch_misses.load(Ordering::Relaxed),
            sequential_scans_detected: self.stats.sequential_scans_detected.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrefetchStatsSnapshot {
    pub prefetch_requests: u64,
    pub prefetch_hits: u64,
    pub prefetch_misses: u64,
    pub sequential_scans_detected: u64,
}
