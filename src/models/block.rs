use serde::Serialize;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct BlockedDay {
    pub id: i64,
    pub date: String,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BlockedSlot {
    pub id: i64,
    pub date: String,
    pub time_slot: String,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Blocks {
    pub blocked_days: Vec<BlockedDay>,
    pub blocked_slots: Vec<BlockedSlot>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Day,
    Slot,
}

impl BlockKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "day" => Some(BlockKind::Day),
            "slot" => Some(BlockKind::Slot),
            _ => None,
        }
    }
}
