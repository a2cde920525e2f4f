//! 置换表
//!
//! 缓存已搜索过的玩家节点期望值。只有精确命中相同剩余深度时才复用，
//! 保证同一局面在同一深度下的搜索结果与是否命中缓存无关。

use std::cell::Cell;

/// 置换表条目
#[derive(Debug, Clone, Copy)]
pub struct TTEntry {
    /// 哈希高 32 位，区分落在同一槽位的不同局面
    pub key: u32,
    /// 期望值
    pub score: f64,
    /// 剩余搜索深度
    pub depth: u8,
    /// 写入时的搜索轮次
    pub age: u8,
}

/// 置换表
///
/// 槽位数取 2 的幂，用哈希低位寻址。统计计数放在 `Cell` 里，
/// 查询只需要共享引用。
pub struct TranspositionTable {
    slots: Vec<Option<TTEntry>>,
    mask: usize,
    /// 当前搜索轮次
    generation: u8,
    hits: Cell<u64>,
    probes: Cell<u64>,
}

impl TranspositionTable {
    /// 按内存上限（MB）创建，至少一个槽位
    pub fn new(size_mb: usize) -> Self {
        let budget = size_mb * 1024 * 1024 / std::mem::size_of::<Option<TTEntry>>();
        // 向下取 2 的幂，不超过内存上限
        let slots = match budget {
            0 => 1,
            n => 1usize << (usize::BITS - 1 - n.leading_zeros()),
        };

        Self {
            slots: vec![None; slots],
            mask: slots - 1,
            generation: 0,
            hits: Cell::new(0),
            probes: Cell::new(0),
        }
    }

    fn slot(&self, hash: u64) -> usize {
        hash as usize & self.mask
    }

    fn check_bits(hash: u64) -> u32 {
        (hash >> 32) as u32
    }

    /// 取出同一局面、同一剩余深度下的期望值
    pub fn probe(&self, hash: u64, depth: u8) -> Option<f64> {
        self.probes.set(self.probes.get() + 1);

        let hit = self.slots[self.slot(hash)]
            .filter(|e| e.key == Self::check_bits(hash) && e.depth == depth)
            .map(|e| e.score);
        if hit.is_some() {
            self.hits.set(self.hits.get() + 1);
        }
        hit
    }

    /// 写入期望值
    ///
    /// 本轮搜索内只让更深的结果覆盖；上一轮留下的条目总是可以覆盖。
    pub fn store(&mut self, hash: u64, score: f64, depth: u8) {
        let generation = self.generation;
        let slot = &mut self.slots[hash as usize & self.mask];

        let keep_existing = matches!(slot, Some(e) if e.age == generation && e.depth > depth);
        if !keep_existing {
            *slot = Some(TTEntry {
                key: Self::check_bits(hash),
                score,
                depth,
                age: generation,
            });
        }
    }

    /// 开始新一轮搜索，命中统计从零计起
    pub fn new_search(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        self.hits.set(0);
        self.probes.set(0);
    }

    pub fn stats(&self) -> TTStats {
        TTStats {
            entries: self.slots.len(),
            used: self.slots.iter().flatten().count(),
            hits: self.hits.get(),
            probes: self.probes.get(),
        }
    }
}

/// 置换表统计
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TTStats {
    pub entries: usize,
    pub used: usize,
    pub hits: u64,
    pub probes: u64,
}

impl TTStats {
    /// 命中率，未查询过时为 0
    pub fn hit_rate(&self) -> f64 {
        match self.probes {
            0 => 0.0,
            probes => self.hits as f64 / probes as f64,
        }
    }

    /// 已占用槽位的比例
    pub fn usage(&self) -> f64 {
        self.used as f64 / self.entries as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tt_store_and_probe() {
        let mut tt = TranspositionTable::new(1);

        let hash = 0x1234567890ABCDEF_u64;
        tt.store(hash, 42.5, 2);

        assert_eq!(tt.probe(hash, 2), Some(42.5));
        // 深度不同不复用
        assert_eq!(tt.probe(hash, 1), None);
        assert_eq!(tt.stats().hits, 1);
        assert_eq!(tt.stats().probes, 2);
    }

    #[test]
    fn test_tt_miss() {
        let tt = TranspositionTable::new(1);
        assert!(tt.probe(0x1234567890ABCDEF, 1).is_none());
        assert_eq!(tt.stats().hit_rate(), 0.0);
    }

    #[test]
    fn test_tt_replacement() {
        let mut tt = TranspositionTable::new(1);
        let hash = 0x1234567890ABCDEF_u64;

        tt.store(hash, 50.0, 3);
        // 同一次搜索中较浅的条目不覆盖
        tt.store(hash, 10.0, 1);
        assert_eq!(tt.probe(hash, 3), Some(50.0));

        // 新一轮搜索后可以覆盖
        tt.new_search();
        tt.store(hash, 10.0, 1);
        assert_eq!(tt.probe(hash, 1), Some(10.0));
    }

    #[test]
    fn test_slot_count_is_power_of_two() {
        let tt = TranspositionTable::new(1);
        let entries = tt.stats().entries;
        assert!(entries.is_power_of_two());
        assert!(entries * std::mem::size_of::<Option<TTEntry>>() <= 1024 * 1024);
        assert_eq!(TranspositionTable::new(0).stats().entries, 1, "至少一个槽位");
    }

    #[test]
    fn test_stats_reset_per_search() {
        let mut tt = TranspositionTable::new(1);
        tt.store(7, 1.0, 1);
        assert_eq!(tt.probe(7, 1), Some(1.0));
        assert_eq!(tt.stats().hit_rate(), 1.0);
        assert!(tt.stats().usage() > 0.0);

        tt.new_search();
        assert_eq!(tt.stats().probes, 0, "新一轮搜索重新计数");
        assert_eq!(tt.stats().used, 1, "条目保留到下一轮");
        assert_eq!(tt.probe(7, 1), Some(1.0));
    }
}
