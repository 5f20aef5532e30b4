use crate::model::{Tunnel, TunnelStats};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Upsert {
    Inserted,
    Replaced(usize),
}

/// Ordered mirror of the backend's tunnel list. Entries are only ever
/// whole records returned by the backend; writes are crate-private so the
/// lifecycle controller stays the single writer.
#[derive(Clone, Debug, Default)]
pub struct TunnelCache {
    tunnels: Vec<Tunnel>,
}

impl TunnelCache {
    pub fn snapshot(&self) -> Vec<Tunnel> {
        self.tunnels.clone()
    }

    pub fn get(&self, id: &str) -> Option<&Tunnel> {
        self.tunnels.iter().find(|tunnel| tunnel.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub(crate) fn len(&self) -> usize {
        self.tunnels.len()
    }

    pub fn stats(&self) -> TunnelStats {
        let total = self.tunnels.len();
        let active = self.tunnels.iter().filter(|tunnel| tunnel.enabled).count();
        TunnelStats {
            total,
            active,
            inactive: total - active,
        }
    }

    pub(crate) fn replace_all(&mut self, tunnels: Vec<Tunnel>) {
        self.tunnels = tunnels;
    }

    pub(crate) fn upsert(&mut self, tunnel: Tunnel) -> Upsert {
        match self.tunnels.iter().position(|entry| entry.id == tunnel.id) {
            Some(index) => {
                self.tunnels[index] = tunnel;
                Upsert::Replaced(index)
            }
            None => {
                self.tunnels.push(tunnel);
                Upsert::Inserted
            }
        }
    }

    pub(crate) fn remove(&mut self, id: &str) -> Option<Tunnel> {
        let index = self.tunnels.iter().position(|tunnel| tunnel.id == id)?;
        Some(self.tunnels.remove(index))
    }
}
