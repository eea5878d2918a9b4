use anyhow::{anyhow, Result};
use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, System};
use tracing::instrument;
use xcb::{
    screensaver::{QueryInfo, QueryInfoReply},
    x::{Atom, Drawable, GetProperty, GrabServer, InternAtom, UngrabServer, Window, ATOM_ANY},
    Connection,
};

use super::{WindowInfo, WindowManager};

fn intern_atom(conn: &Connection, name: &[u8]) -> Result<Atom> {
    let reply = conn.wait_for_reply(conn.send_request(&InternAtom {
        only_if_exists: false,
        name,
    }))?;
    Ok(reply.atom())
}

fn get_pid(conn: &Connection, window: Window, pid_atom: Atom) -> Result<Option<u32>> {
    let result = conn.wait_for_reply(conn.send_request(&GetProperty {
        delete: false,
        window,
        property: pid_atom,
        r#type: ATOM_ANY,
        long_offset: 0,
        long_length: 1,
    }))?;
    Ok(result.value::<u32>().first().copied())
}

fn get_active_window(conn: &Connection, root: Window, active_window_atom: Atom) -> Result<Window> {
    let result = conn.wait_for_reply(conn.send_request(&GetProperty {
        delete: false,
        window: root,
        property: active_window_atom,
        r#type: ATOM_ANY,
        long_offset: 0,
        long_length: 1,
    }))?;
    result
        .value::<Window>()
        .first()
        .copied()
        .ok_or_else(|| anyhow!("No window is focused"))
}

fn get_title(conn: &Connection, window: Window, wm_name_atom: Atom) -> Result<String> {
    let wm_name = conn.wait_for_reply(conn.send_request(&GetProperty {
        delete: false,
        window,
        property: wm_name_atom,
        r#type: ATOM_ANY,
        long_offset: 0,
        long_length: 1024,
    }))?;
    Ok(String::from_utf8_lossy(wm_name.value::<u8>()).into_owned())
}

/// Observes the focused window through EWMH properties of the root window.
pub struct LinuxWindowManager {
    connection: Connection,
    preferred_screen: usize,
    active_window_atom: Atom,
    window_name_atom: Atom,
    pid_atom: Atom,
    system: System,
}

impl LinuxWindowManager {
    pub fn new() -> Result<Self> {
        let (connection, preferred_screen) = xcb::Connection::connect(None)?;
        let active_window_atom = intern_atom(&connection, b"_NET_ACTIVE_WINDOW")?;
        let window_name_atom = intern_atom(&connection, b"_NET_WM_NAME")?;
        let pid_atom = intern_atom(&connection, b"_NET_WM_PID")?;
        Ok(Self {
            connection,
            preferred_screen: preferred_screen.max(0) as usize,
            active_window_atom,
            window_name_atom,
            pid_atom,
            system: System::new(),
        })
    }

    fn root(&self) -> Result<Window> {
        self.connection
            .get_setup()
            .roots()
            .nth(self.preferred_screen)
            .map(|screen| screen.root())
            .ok_or_else(|| anyhow!("Screen {} doesn't exist", self.preferred_screen))
    }

    /// Returns the executable path and process name.
    fn describe_process(&mut self, id: u32) -> Option<(String, String)> {
        let pid = Pid::from_u32(id);
        self.system.refresh_processes_specifics(
            ProcessesToUpdate::Some(&[pid]),
            true,
            ProcessRefreshKind::everything(),
        );
        let process = self.system.process(pid)?;
        let path = process.exe()?.to_str()?.to_string();
        let name = process.name().to_string_lossy().into_owned();
        Some((path, name))
    }
}

impl LinuxWindowManager {
    fn get_active_inner(&mut self) -> Result<WindowInfo> {
        let root = self.root()?;
        let window = get_active_window(&self.connection, root, self.active_window_atom)?;
        let title = get_title(&self.connection, window, self.window_name_atom)?;
        let process_id = get_pid(&self.connection, window, self.pid_atom)?
            .ok_or_else(|| anyhow!("Focused window doesn't expose a pid"))?;
        let (process_path, display_name) = self
            .describe_process(process_id)
            .ok_or_else(|| anyhow!("Process {process_id} disappeared"))?;

        Ok(WindowInfo {
            process_path,
            display_name,
            title,
            url: None,
            process_id,
        })
    }
}

impl WindowManager for LinuxWindowManager {
    #[instrument(skip(self))]
    fn get_active_window(&mut self) -> Result<WindowInfo> {
        // Properties of the focused window are read while nothing else can change them.
        let _ = self.connection.send_request(&GrabServer {});
        let result = self.get_active_inner();
        let _ = self.connection.send_request(&UngrabServer {});
        result
    }

    #[instrument(skip(self))]
    fn get_idle_time(&mut self) -> Result<u32> {
        let root = self.root()?;
        let idle = self.connection.send_request(&QueryInfo {
            drawable: Drawable::Window(root),
        });
        let reply: QueryInfoReply = self.connection.wait_for_reply(idle)?;
        Ok(reply.ms_since_user_input())
    }
}
