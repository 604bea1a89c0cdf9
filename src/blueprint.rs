use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::BlueprintError;
use crate::types::DroneKind;

/// Stat block for one kind of drone. Every drone of a kind shares it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DroneStats {
    pub health: i32,
    pub capacity: u32,
    pub moves: u32,
}

impl DroneStats {
    pub const fn scout() -> Self {
        Self {
            health: 40,
            capacity: 5,
            moves: 1,
        }
    }

    pub const fn miner() -> Self {
        Self {
            health: 30,
            capacity: 10,
            moves: 2,
        }
    }

    pub const fn base(kind: DroneKind) -> Self {
        match kind {
            DroneKind::Scout => Self::scout(),
            DroneKind::Miner => Self::miner(),
        }
    }

    /// Refined minerals needed to build one drone with these stats:
    /// `health / 10 + capacity / 5 + moves * 3`, which must come out whole.
    pub fn creation_cost(&self) -> Result<u32, BlueprintError> {
        // worked in tenths to stay in integers
        let tenths =
            i64::from(self.health) + 2 * i64::from(self.capacity) + 30 * i64::from(self.moves);
        if self.health <= 0 || tenths % 10 != 0 {
            return Err(BlueprintError::FractionalCost {
                health: self.health,
                capacity: self.capacity,
                moves: self.moves,
            });
        }
        u32::try_from(tenths / 10).map_err(|_| BlueprintError::FractionalCost {
            health: self.health,
            capacity: self.capacity,
            moves: self.moves,
        })
    }
}

/// Validates a custom stat block.
pub fn drone_blueprint(health: i32, capacity: u32, moves: u32) -> Result<DroneStats, BlueprintError> {
    let stats = DroneStats {
        health,
        capacity,
        moves,
    };
    stats.creation_cost()?;
    Ok(stats)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Upgrade {
    Health,
    Capacity,
    Moves,
}

impl Upgrade {
    /// Price per drone of the kind being upgraded.
    fn unit_cost(self) -> u32 {
        match self {
            Upgrade::Health | Upgrade::Capacity => 1,
            Upgrade::Moves => 3,
        }
    }

    fn apply(self, stats: &mut DroneStats) {
        match self {
            Upgrade::Health => stats.health += 10,
            Upgrade::Capacity => stats.capacity += 5,
            Upgrade::Moves => stats.moves += 1,
        }
    }
}

const UPGRADE_ORDER: [(DroneKind, Upgrade); 6] = [
    (DroneKind::Miner, Upgrade::Capacity),
    (DroneKind::Scout, Upgrade::Health),
    (DroneKind::Miner, Upgrade::Health),
    (DroneKind::Scout, Upgrade::Capacity),
    (DroneKind::Miner, Upgrade::Moves),
    (DroneKind::Scout, Upgrade::Moves),
];

/// How a starting budget is turned into drones.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FleetPlan {
    pub scout: DroneStats,
    pub miner: DroneStats,
    pub scouts: u32,
    pub miners: u32,
    pub spent: u32,
    pub remaining: u32,
}

impl FleetPlan {
    pub fn stats(&self, kind: DroneKind) -> DroneStats {
        match kind {
            DroneKind::Scout => self.scout,
            DroneKind::Miner => self.miner,
        }
    }

    pub fn count(&self, kind: DroneKind) -> u32 {
        match kind {
            DroneKind::Scout => self.scouts,
            DroneKind::Miner => self.miners,
        }
    }

    pub fn total(&self) -> u32 {
        self.scouts + self.miners
    }

    fn spend(&mut self, amount: u32) {
        self.spent += amount;
        self.remaining -= amount;
    }
}

/// Buys as many drones as `budget` and `max_fleet` allow, alternating scout and
/// miner, then spends what is left on upgrades in a fixed order until a full pass
/// over the order buys nothing.
pub fn plan_fleet(budget: u32, max_fleet: u32) -> Result<FleetPlan, BlueprintError> {
    let required = DroneStats::scout().creation_cost()? + DroneStats::miner().creation_cost()?;
    if budget < required || max_fleet < 2 {
        return Err(BlueprintError::InsufficientBudget { budget, required });
    }

    let mut plan = FleetPlan {
        scout: DroneStats::scout(),
        miner: DroneStats::miner(),
        scouts: 0,
        miners: 0,
        spent: 0,
        remaining: budget,
    };

    while plan.total() < max_fleet {
        let kind = if plan.scouts <= plan.miners {
            DroneKind::Scout
        } else {
            DroneKind::Miner
        };
        let cost = plan.stats(kind).creation_cost()?;
        if cost > plan.remaining {
            break;
        }
        plan.spend(cost);
        match kind {
            DroneKind::Scout => plan.scouts += 1,
            DroneKind::Miner => plan.miners += 1,
        }
    }

    loop {
        let mut bought = false;
        for (kind, upgrade) in UPGRADE_ORDER {
            let price = upgrade.unit_cost() * plan.count(kind);
            if price == 0 || price > plan.remaining {
                continue;
            }
            plan.spend(price);
            match kind {
                DroneKind::Scout => upgrade.apply(&mut plan.scout),
                DroneKind::Miner => upgrade.apply(&mut plan.miner),
            }
            bought = true;
        }
        if !bought {
            break;
        }
    }

    plan.scout.creation_cost()?;
    plan.miner.creation_cost()?;
    debug!(?plan, "fleet planned");
    Ok(plan)
}
