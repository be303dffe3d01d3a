use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a block type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(transparent)]
pub struct BlockId(pub u16);

impl Default for BlockId {
    fn default() -> Self {
        BlockId::AIR
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Display block name if it's a known block
        match *self {
            BlockId::AIR => write!(f, "Air"),
            BlockId::GRASS => write!(f, "Grass"),
            BlockId::DIRT => write!(f, "Dirt"),
            BlockId::STONE => write!(f, "Stone"),
            BlockId::WOOD => write!(f, "Wood"),
            BlockId::SAND => write!(f, "Sand"),
            BlockId::WATER => write!(f, "Water"),
            BlockId::LEAVES => write!(f, "Leaves"),
            BlockId::BEDROCK => write!(f, "Bedrock"),
            _ => write!(f, "Block({})", self.0),
        }
    }
}

impl BlockId {
    pub const AIR: BlockId = BlockId(0);
    pub const GRASS: BlockId = BlockId(1);
    pub const DIRT: BlockId = BlockId(2);
    pub const STONE: BlockId = BlockId(3);
    pub const WOOD: BlockId = BlockId(4);
    pub const SAND: BlockId = BlockId(5);
    pub const WATER: BlockId = BlockId(6);
    pub const LEAVES: BlockId = BlockId(7);
    pub const BEDROCK: BlockId = BlockId(13);

    /// Create a new BlockId from a raw u16 value
    pub const fn new(id: u16) -> Self {
        BlockId(id)
    }

    /// Anything other than air counts towards the column height map
    #[inline]
    pub const fn is_solid(self) -> bool {
        self.0 != BlockId::AIR.0
    }
}
