//! 출발지별 샤딩 스캐너
//!
//! 탐지기의 연속 매칭 카운터는 한 출발지의 라인 순서 안에서만 의미가 있습니다.
//! [`ShardedScanner`]는 컨텍스트의 `ip_address`마다 독립된 [`Scanner`]를 두고,
//! 각 샤드를 `Mutex`로 직렬화하여 여러 스레드가 동시에 라인을 넣어도
//! 같은 출발지의 라인은 들어온 순서대로 처리되도록 합니다.
//!
//! 샤드 수는 `max_shards`로 제한되며, 가득 차면 가장 오래 사용되지 않은 샤드를 제거합니다.
//! 다른 스레드가 분석 중인 샤드는 제거하지 않으므로, 모든 샤드가 사용 중이면
//! 일시적으로 `max_shards`를 넘을 수 있습니다.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use metrics::gauge;
use tracing::debug;

use shadowguard_core::config::ShadowguardConfig;
use shadowguard_core::metrics::SCANNER_ACTIVE_SHARDS;
use shadowguard_core::pipeline::Detector;
use shadowguard_core::types::AnalysisContext;

use crate::error::DetectorError;
use crate::scanner::Scanner;
use crate::sql_injection::{SqlInjectionDetector, UNKNOWN_IP};

type ScannerFactory = Box<dyn Fn() -> Scanner + Send + Sync>;

struct Shard {
    scanner: Arc<Mutex<Scanner>>,
    last_used: u64,
}

#[derive(Default)]
struct ShardTable {
    shards: HashMap<String, Shard>,
    tick: u64,
}

/// 출발지 IP별로 독립된 스캐너를 유지하는 스캐너
pub struct ShardedScanner {
    table: Mutex<ShardTable>,
    factory: ScannerFactory,
    max_shards: usize,
}

impl ShardedScanner {
    /// 샤드 팩토리와 최대 샤드 수로 생성합니다.
    ///
    /// `max_shards`가 0이면 1로 취급합니다.
    pub fn new<F>(max_shards: usize, factory: F) -> Self
    where
        F: Fn() -> Scanner + Send + Sync + 'static,
    {
        Self {
            table: Mutex::new(ShardTable::default()),
            factory: Box::new(factory),
            max_shards: max_shards.max(1),
        }
    }

    /// 설정으로부터 생성합니다.
    ///
    /// 시그니처는 한 번만 컴파일되고 샤드마다 복제되므로
    /// 잘못된 패턴에 대한 에러 레코드도 한 번만 남습니다.
    pub fn from_config(config: &ShadowguardConfig) -> Result<Self, DetectorError> {
        if config.scan.max_shards == 0 {
            return Err(DetectorError::Config {
                field: "scan.max_shards".to_owned(),
                reason: "must be greater than 0".to_owned(),
            });
        }

        let prototype = SqlInjectionDetector::from_config(&config.detectors.sql_injection);
        Ok(Self::new(config.scan.max_shards, move || {
            let detectors: Vec<Box<dyn Detector>> = vec![Box::new(prototype.clone())];
            Scanner::from_detectors(detectors)
        }))
    }

    /// 컨텍스트의 출발지에 해당하는 샤드로 라인을 분석합니다.
    pub fn analyze_log(&self, line: &str, context: &AnalysisContext) -> bool {
        if line.trim().is_empty() {
            return false;
        }

        let key = context.ip_address().unwrap_or(UNKNOWN_IP);
        let shard = self.shard_for(key);
        let mut scanner = lock(&*shard);
        scanner.analyze_log(line, context)
    }

    /// 현재 유지 중인 샤드 수
    pub fn shard_count(&self) -> usize {
        lock(&self.table).shards.len()
    }

    pub fn max_shards(&self) -> usize {
        self.max_shards
    }

    /// 해당 출발지의 샤드가 존재하는지 여부
    pub fn contains(&self, source: &str) -> bool {
        lock(&self.table).shards.contains_key(source)
    }

    fn shard_for(&self, key: &str) -> Arc<Mutex<Scanner>> {
        let mut table = lock(&self.table);
        table.tick += 1;
        let tick = table.tick;

        if let Some(shard) = table.shards.get_mut(key) {
            shard.last_used = tick;
            return Arc::clone(&shard.scanner);
        }

        while table.shards.len() >= self.max_shards {
            if !evict_least_recent(&mut table) {
                debug!(
                    shards = table.shards.len(),
                    "all shards busy, exceeding max_shards"
                );
                break;
            }
        }

        let scanner = Arc::new(Mutex::new((self.factory)()));
        table.shards.insert(
            key.to_owned(),
            Shard {
                scanner: Arc::clone(&scanner),
                last_used: tick,
            },
        );
        gauge!(SCANNER_ACTIVE_SHARDS).set(table.shards.len() as f64);
        scanner
    }
}

impl std::fmt::Debug for ShardedScanner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShardedScanner")
            .field("shards", &self.shard_count())
            .field("max_shards", &self.max_shards)
            .finish()
    }
}

/// 유휴 샤드 중 가장 오래 사용되지 않은 것을 제거합니다. 제거했으면 `true`.
///
/// 샤드 핸들은 테이블 잠금 안에서만 복제되므로, 잠금을 쥔 상태에서
/// `strong_count == 1`이면 그 샤드를 분석 중인 스레드가 없습니다.
fn evict_least_recent(table: &mut ShardTable) -> bool {
    let oldest = table
        .shards
        .iter()
        .filter(|(_, shard)| Arc::strong_count(&shard.scanner) == 1)
        .min_by_key(|(_, shard)| shard.last_used)
        .map(|(key, _)| key.clone());

    match oldest {
        Some(key) => {
            table.shards.remove(&key);
            debug!(source = key.as_str(), "evicted least recently used shard");
            true
        }
        None => false,
    }
}

// 탐지기 panic은 Scanner 안에서 잡히지만, 혹시 잠금이 오염되어도 상태는 계속 사용
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
