//! Handler 分配：对展开后的单元按地址做连续聚合。
//!
//! 规则：
//! - `mbUsed=false` 的变量不参与分配
//! - 每个变量按 multiplier 展开为单元（地址取自 `unit_registers`），全部展开后再统一排序
//! - 排序键：地址升序；同地址按输入行序（先出现者先打包），再按单元序号
//! - 顺序扫描：当前单元地址 == 上一单元地址 + 尺寸 时并入当前 handler，否则新开 handler
//!   （间隙与重叠都会断开；重叠不报错）
//! - 变量的 handler/offset 取其第 0 个单元；`mbIdx` 为变量在排序结果中首次出现的名次

use log::debug;
use serde::{Deserialize, Serialize};

use crate::domain::model::{Allocation, Handler, SpecAssignment, VariableSpec};

/// 额外断开规则（默认全部关闭：只按地址连续性聚合）。
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct AllocatorOptions {
    /// 功能码不同的单元不进入同一 handler，且功能码作为首要排序键。
    pub group_by_function_code: bool,
    /// 单个 handler 的长度上限（与 typeSize 同单位）。
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_handler_length: Option<u32>,
}

#[derive(Clone, Copy, Debug)]
struct ExpandedUnit {
    /// 所属 VariableSpec 在输入切片中的位置
    spec: usize,
    row: usize,
    unit: u32,
    address: u32,
    size: u32,
    function_code: u8,
}

impl ExpandedUnit {
    fn end(&self) -> u64 {
        u64::from(self.address) + u64::from(self.size)
    }
}

pub fn allocate(specs: &[VariableSpec], options: &AllocatorOptions) -> Allocation {
    let mut units = expand_units(specs);
    units.sort_by(|a, b| {
        let by_function = if options.group_by_function_code {
            a.function_code.cmp(&b.function_code)
        } else {
            std::cmp::Ordering::Equal
        };
        by_function
            .then_with(|| a.address.cmp(&b.address))
            .then_with(|| a.row.cmp(&b.row))
            .then_with(|| a.spec.cmp(&b.spec))
            .then_with(|| a.unit.cmp(&b.unit))
    });

    let mut handlers: Vec<Handler> = Vec::new();
    let mut current: Option<Handler> = None;
    let mut previous: Option<ExpandedUnit> = None;

    let mut first_unit: Vec<Option<(u32, u32)>> = vec![None; specs.len()];
    let mut rank: Vec<Option<u32>> = vec![None; specs.len()];
    let mut next_rank: u32 = 0;

    for unit in &units {
        let extend = match (&current, previous) {
            (Some(handler), Some(prev)) => continues_handler(handler, &prev, unit, options),
            _ => false,
        };

        if !extend {
            if let Some(done) = current.take() {
                handlers.push(done);
            }
        }
        let handler =
            current.get_or_insert_with(|| Handler::open(handlers.len() as u32, unit.address));
        handler.length += unit.size;

        if rank[unit.spec].is_none() {
            rank[unit.spec] = Some(next_rank);
            next_rank += 1;
        }
        if unit.unit == 0 {
            first_unit[unit.spec] = Some((handler.id, unit.address - handler.start_address));
        }

        previous = Some(*unit);
    }

    if let Some(done) = current {
        handlers.push(done);
    }

    let assignments = first_unit
        .into_iter()
        .zip(rank)
        .map(|(first, idx)| match (first, idx) {
            (Some((handler_id, handler_offset)), Some(idx)) => Some(SpecAssignment {
                handler_id,
                handler_offset,
                idx,
            }),
            _ => None,
        })
        .collect();

    debug!(
        "allocated {} units from {} specs into {} handlers",
        units.len(),
        specs.len(),
        handlers.len()
    );

    Allocation {
        assignments,
        handlers,
    }
}

fn expand_units(specs: &[VariableSpec]) -> Vec<ExpandedUnit> {
    specs
        .iter()
        .enumerate()
        .filter(|(_, spec)| spec.used)
        .flat_map(|(position, spec)| {
            spec.unit_registers
                .iter()
                .enumerate()
                .map(move |(unit, address)| ExpandedUnit {
                    spec: position,
                    row: spec.row,
                    unit: unit as u32,
                    address: *address,
                    size: spec.type_size,
                    function_code: spec.function_code,
                })
        })
        .collect()
}

fn continues_handler(
    handler: &Handler,
    prev: &ExpandedUnit,
    unit: &ExpandedUnit,
    options: &AllocatorOptions,
) -> bool {
    let contiguous = prev.end() == u64::from(unit.address);
    let same_function = !options.group_by_function_code || prev.function_code == unit.function_code;
    let fits = options
        .max_handler_length
        .map_or(true, |max| u64::from(handler.length) + u64::from(unit.size) <= u64::from(max));

    contiguous && same_function && fits
}
