//! Detecting a running Steam client

use sysinfo::{ProcessRefreshKind, ProcessesToUpdate, System};

/// Process names the Steam client runs under
const STEAM_PROCESS_NAMES: &[&str] = &["steam", "steam.exe"];

/// Answers "is the owning platform running right now?"
pub trait ProcessProbe: Sync {
    fn is_running(&self) -> bool;
}

impl<F> ProcessProbe for F
where
    F: Fn() -> bool + Sync,
{
    fn is_running(&self) -> bool {
        self()
    }
}

/// Probe backed by the OS process table
#[derive(Debug, Default, Clone, Copy)]
pub struct SteamProcessProbe;

impl ProcessProbe for SteamProcessProbe {
    fn is_running(&self) -> bool {
        let mut system = System::new();
        system.refresh_processes_specifics(
            ProcessesToUpdate::All,
            true,
            ProcessRefreshKind::nothing(),
        );

        system.processes().values().any(|process| {
            let name = process.name().to_string_lossy();
            is_steam_process(&name)
        })
    }
}

fn is_steam_process(name: &str) -> bool {
    STEAM_PROCESS_NAMES
        .iter()
        .any(|candidate| name.eq_ignore_ascii_case(candidate))
}
