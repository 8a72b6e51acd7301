//! The fixed nine-card power deck and its behavior table.
//!
//! Cards are immutable catalog data. Everything the move pipeline needs to know
//! about a power (how many uses it grants, whether it bends movement, what it
//! does on capture) is looked up through [`behavior`] instead of branching on
//! the id at each call site.

use crate::game::config::GameMode;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum PowerId {
    Rahu,
    Ketu,
    Surya,
    Chandra,
    Guru,
    Shukra,
    Budha,
    Mangala,
    Shani,
}

impl PowerId {
    pub const ALL: [PowerId; 9] = [
        PowerId::Rahu,
        PowerId::Ketu,
        PowerId::Surya,
        PowerId::Chandra,
        PowerId::Guru,
        PowerId::Shukra,
        PowerId::Budha,
        PowerId::Mangala,
        PowerId::Shani,
    ];

    #[inline]
    pub fn card(self) -> &'static PowerCard {
        card(self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PowerCard {
    pub id: PowerId,
    pub name: &'static str,
    /// Display color as a CSS hex string.
    pub color: &'static str,
    pub radius: u8,
    pub tier: u8,
    /// Base price in clock seconds.
    pub cost: u32,
    pub description: &'static str,
}

impl PowerCard {
    /// Price for the side placing the card. Horde games halve the base price
    /// and the final stretch halves it again, each step rounding up.
    pub fn cost_for(&self, mode: GameMode, final_stretch: bool) -> u32 {
        let divisor = match (mode, final_stretch) {
            (GameMode::Standard, false) => 1,
            (GameMode::Standard, true) | (GameMode::Horde, false) => 2,
            (GameMode::Horde, true) => 4,
        };
        self.cost.div_ceil(divisor)
    }
}

pub const CATALOG: [PowerCard; 9] = [
    PowerCard {
        id: PowerId::Rahu,
        name: "Rahu",
        color: "#9333ea",
        radius: 3,
        tier: 1,
        cost: 7,
        description: "Pass through pieces for 2 moves",
    },
    PowerCard {
        id: PowerId::Ketu,
        name: "Ketu",
        color: "#f97316",
        radius: 3,
        tier: 1,
        cost: 8,
        description: "When captured: +12s you, -12s opponent",
    },
    PowerCard {
        id: PowerId::Surya,
        name: "Surya",
        color: "#fbbf24",
        radius: 2,
        tier: 1,
        cost: 8,
        description: "Can't be captured for 2 moves",
    },
    PowerCard {
        id: PowerId::Chandra,
        name: "Chandra",
        color: "#e5e7eb",
        radius: 2,
        tier: 2,
        cost: 10,
        description: "Place 1-2 clones on rank (2nd = +5s)",
    },
    PowerCard {
        id: PowerId::Guru,
        name: "Guru",
        color: "#a855f7",
        radius: 2,
        tier: 2,
        cost: 9,
        description: "Resurrect your piece where it died",
    },
    PowerCard {
        id: PowerId::Shukra,
        name: "Shukra",
        color: "#ec4899",
        radius: 2,
        tier: 2,
        cost: 11,
        description: "Triple time on next 2 captures",
    },
    PowerCard {
        id: PowerId::Budha,
        name: "Budha",
        color: "#3b82f6",
        radius: 1,
        tier: 3,
        cost: 10,
        description: "Two moves (not if first captures)",
    },
    PowerCard {
        id: PowerId::Mangala,
        name: "Mangala",
        color: "#ef4444",
        radius: 1,
        tier: 3,
        cost: 12,
        description: "Capture any adjacent piece",
    },
    PowerCard {
        id: PowerId::Shani,
        name: "Shani",
        color: "#1f2937",
        radius: 1,
        tier: 3,
        cost: 14,
        description: "Freeze enemy piece for 2 turns",
    },
];

pub fn card(id: PowerId) -> &'static PowerCard {
    // CATALOG is laid out in PowerId declaration order.
    &CATALOG[id as usize]
}

/// Geometric movement override carried by a powered piece.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOverride {
    /// Move along the piece's shape ignoring blockers.
    PassThrough,
    /// Capture any enemy on an adjacent square.
    AdjacentCapture,
}

/// Effect applied to the capture award when the capturing piece holds the power.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttackerHook {
    MultiplyAward(u32),
}

/// Effect applied when a piece holding the power is captured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VictimHook {
    /// Replace the award: capturer loses, owner gains this many seconds.
    TimeSwing(u32),
}

/// Multi-step interaction a power opens instead of granting a buff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolverKind {
    Clone,
    Resurrect,
    Freeze,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PowerBehavior {
    /// Uses granted to the activating piece; zero for resolver powers.
    pub uses_granted: u8,
    pub move_override: Option<MoveOverride>,
    pub on_attack: Option<AttackerHook>,
    pub on_captured: Option<VictimHook>,
    /// Captures onto the holder are refused while uses remain.
    pub shields_holder: bool,
    /// The holder's final use grants the side another move.
    pub extra_move: bool,
    pub resolver: Option<ResolverKind>,
}

const INERT: PowerBehavior = PowerBehavior {
    uses_granted: 0,
    move_override: None,
    on_attack: None,
    on_captured: None,
    shields_holder: false,
    extra_move: false,
    resolver: None,
};

pub const fn behavior(id: PowerId) -> PowerBehavior {
    match id {
        PowerId::Rahu => PowerBehavior {
            uses_granted: 2,
            move_override: Some(MoveOverride::PassThrough),
            ..INERT
        },
        PowerId::Ketu => PowerBehavior {
            uses_granted: 1,
            on_captured: Some(VictimHook::TimeSwing(12)),
            ..INERT
        },
        PowerId::Surya => PowerBehavior {
            uses_granted: 2,
            shields_holder: true,
            ..INERT
        },
        PowerId::Shukra => PowerBehavior {
            uses_granted: 2,
            on_attack: Some(AttackerHook::MultiplyAward(3)),
            ..INERT
        },
        PowerId::Budha => PowerBehavior {
            uses_granted: 1,
            extra_move: true,
            ..INERT
        },
        PowerId::Mangala => PowerBehavior {
            uses_granted: 3,
            move_override: Some(MoveOverride::AdjacentCapture),
            ..INERT
        },
        PowerId::Chandra => PowerBehavior {
            resolver: Some(ResolverKind::Clone),
            ..INERT
        },
        PowerId::Guru => PowerBehavior {
            resolver: Some(ResolverKind::Resurrect),
            ..INERT
        },
        PowerId::Shani => PowerBehavior {
            resolver: Some(ResolverKind::Freeze),
            ..INERT
        },
    }
}

/// Highest card tier opened by captures so far. Only ever grows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TierUnlocks(u8);

impl TierUnlocks {
    #[inline]
    pub fn highest(self) -> u8 {
        self.0
    }

    #[inline]
    pub fn is_unlocked(self, tier: u8) -> bool {
        tier >= 1 && tier <= self.0
    }

    /// Open every tier up to and including `tier`. Returns true if anything
    /// new was unlocked.
    pub fn unlock_through(&mut self, tier: u8) -> bool {
        let tier = tier.min(3);
        if tier > self.0 {
            self.0 = tier;
            true
        } else {
            false
        }
    }
}
