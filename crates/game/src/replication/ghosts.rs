use std::collections::HashSet;

use crate::sim::{Shell, Tank};

/// The opponent's shells as last reported, plus the ids that have already
/// damaged the local tank.
#[derive(Debug, Default)]
pub struct GhostSet {
    shells: Vec<Shell>,
    hit_ids: HashSet<u32>,
}

impl GhostSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shells(&self) -> &[Shell] {
        &self.shells
    }

    pub fn hit_ids(&self) -> &HashSet<u32> {
        &self.hit_ids
    }

    /// Replaces the shell list wholesale. The hit-id set is left alone.
    pub fn replace_shells(&mut self, shells: Vec<Shell>) {
        self.shells = shells;
    }

    /// Ids of ghost shells that newly overlap `tank`. Each id is reported at
    /// most once for as long as it keeps appearing. Ids no longer present are
    /// forgotten afterwards.
    pub fn resolve_hits(&mut self, tank: &Tank) -> Vec<u32> {
        let mut fresh = Vec::new();
        for shell in &self.shells {
            if shell.overlaps(tank) && self.hit_ids.insert(shell.id) {
                fresh.push(shell.id);
            }
        }

        let shells = &self.shells;
        self.hit_ids.retain(|id| shells.iter().any(|s| s.id == *id));
        fresh
    }

    pub fn clear(&mut self) {
        self.shells.clear();
        self.hit_ids.clear();
    }
}
