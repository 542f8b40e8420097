//! Interactive input: the current user's name and a password read with the
//! terminal echo switched off.

use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::os::unix::io::AsRawFd;

use zeroize::Zeroizing;

/// Name of the user running this process, from the password database.
pub fn current_user() -> Option<String> {
    users::get_user_by_uid(users::get_current_uid()).map(|u| u.name().to_string_lossy().into_owned())
}

/// Restores the saved terminal attributes when dropped.
struct EchoGuard<'a> {
    tty: &'a File,
    saved: libc::termios,
}

impl<'a> EchoGuard<'a> {
    fn disable(tty: &'a File) -> io::Result<Self> {
        let fd = tty.as_raw_fd();
        // SAFETY: termios is plain old data; tcgetattr fills it in.
        let mut saved: libc::termios = unsafe { std::mem::zeroed() };
        // SAFETY: `fd` is an open descriptor owned by `tty`.
        if unsafe { libc::tcgetattr(fd, &mut saved) } != 0 {
            return Err(io::Error::last_os_error());
        }
        let mut silent = saved;
        silent.c_lflag &= !libc::ECHO;
        silent.c_lflag |= libc::ECHONL;
        // SAFETY: As above.
        if unsafe { libc::tcsetattr(fd, libc::TCSANOW, &silent) } != 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(EchoGuard { tty, saved })
    }
}

impl Drop for EchoGuard<'_> {
    fn drop(&mut self) {
        // SAFETY: Restores the attributes read in `disable` on the same descriptor.
        let _ = unsafe { libc::tcsetattr(self.tty.as_raw_fd(), libc::TCSANOW, &self.saved) };
    }
}

/// Prompt on the controlling terminal and read a line without echoing it.
pub fn read_password(prompt: &str) -> io::Result<Zeroizing<String>> {
    let tty = OpenOptions::new().read(true).write(true).open("/dev/tty")?;
    (&tty).write_all(prompt.as_bytes())?;
    (&tty).flush()?;

    let _guard = EchoGuard::disable(&tty)?;
    read_line(BufReader::new(&tty))
}

/// Read a password from standard input, for non-interactive use.
pub fn read_password_stdin() -> io::Result<Zeroizing<String>> {
    read_line(io::stdin().lock())
}

fn read_line<R: BufRead>(mut reader: R) -> io::Result<Zeroizing<String>> {
    let mut line = Zeroizing::new(String::new());
    reader.read_line(&mut line)?;
    let len = line.trim_end_matches(['\n', '\r']).len();
    line.truncate(len);
    Ok(line)
}
