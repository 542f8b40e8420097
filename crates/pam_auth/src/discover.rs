//! Ask the dynamic linker's cache where a library lives, the way
//! `find_library` does on Linux, before falling back to well-known names.

use std::process::Command;

use tracing::debug;

const LDCONFIG: &[&str] = &["/sbin/ldconfig", "/usr/sbin/ldconfig", "ldconfig"];

/// Paths of `lib<nickname>.so*` known to the linker cache, in cache order.
///
/// Returns nothing on platforms without `ldconfig` or when it cannot be run.
pub fn find_library(nickname: &str) -> Vec<String> {
    if !cfg!(target_os = "linux") {
        return Vec::new();
    }
    for program in LDCONFIG {
        match Command::new(program).arg("-p").env("LC_ALL", "C").output() {
            Ok(output) if output.status.success() => {
                let found = parse_ldconfig(&String::from_utf8_lossy(&output.stdout), nickname);
                debug!(library = nickname, ?found, "linker cache lookup");
                return found;
            }
            Ok(output) => debug!(program, status = %output.status, "ldconfig failed"),
            Err(err) => debug!(program, "could not run ldconfig: {err}"),
        }
    }
    Vec::new()
}

/// Pick the entries for `lib<nickname>.so` and its versioned names out of
/// `ldconfig -p` output.
///
/// Lines look like `\tlibpam.so.0 (libc6,x86-64) => /lib/x86_64-linux-gnu/libpam.so.0`.
pub(crate) fn parse_ldconfig(output: &str, nickname: &str) -> Vec<String> {
    let base = format!("lib{nickname}.so");
    output
        .lines()
        .filter_map(|line| {
            let (name, rest) = line.trim().split_once(' ')?;
            let versioned = name.strip_prefix(base.as_str())?;
            if !(versioned.is_empty() || versioned.starts_with('.')) {
                return None;
            }
            let (_, path) = rest.split_once("=> ")?;
            Some(path.trim().to_string())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const CACHE: &str = "\
1234 libs found in cache `/etc/ld.so.cache'
\tlibpamc.so.0 (libc6,x86-64) => /lib/x86_64-linux-gnu/libpamc.so.0
\tlibpam_misc.so.0 (libc6,x86-64) => /lib/x86_64-linux-gnu/libpam_misc.so.0
\tlibpam.so.0 (libc6,x86-64) => /lib/x86_64-linux-gnu/libpam.so.0
\tlibpam.so (libc6,x86-64) => /lib/x86_64-linux-gnu/libpam.so
\tlibc.so.6 (libc6,x86-64, OS ABI: Linux 3.2.0) => /lib/x86_64-linux-gnu/libc.so.6
Cache generated by: ldconfig (GNU libc) stable release version 2.36
";

    #[test]
    fn picks_exact_and_versioned_names_only() {
        assert_eq!(
            parse_ldconfig(CACHE, "pam"),
            vec!["/lib/x86_64-linux-gnu/libpam.so.0", "/lib/x86_64-linux-gnu/libpam.so"]
        );
        assert_eq!(parse_ldconfig(CACHE, "c"), vec!["/lib/x86_64-linux-gnu/libc.so.6"]);
    }

    #[test]
    fn unknown_library_finds_nothing() {
        assert!(parse_ldconfig(CACHE, "yubikey").is_empty());
        assert!(parse_ldconfig("", "pam").is_empty());
    }
}
