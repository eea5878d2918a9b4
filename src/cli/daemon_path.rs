use std::path::PathBuf;

/// The daemon is installed next to the command line executable.
pub fn to_daemon_path(mut path: PathBuf) -> PathBuf {
    path.set_file_name("deskbeat-daemon");
    #[cfg(windows)]
    {
        path.set_extension("exe");
    }
    path
}
