//! Raw syscall capability
//!
//! The interpreter never talks to the OS directly; every `syscallN` that is
//! not the emulated `write` goes through a [`Syscalls`] implementation.

/// Host syscall number of `write`
#[cfg(target_os = "linux")]
pub const SYS_WRITE: i64 = libc::SYS_write as i64;
#[cfg(not(target_os = "linux"))]
pub const SYS_WRITE: i64 = 1;

/// Returned for raw syscalls on hosts without a syscall bridge (`-ENOSYS`)
pub const ENOSYS: i64 = -38;

/// One method per syscall arity. Return values follow the kernel
/// convention: a negative value is `-errno`.
pub trait Syscalls {
    /// Syscall number the interpreter emulates as a write to stdout/stderr
    fn write_number(&self) -> i64 {
        SYS_WRITE
    }

    fn syscall0(&mut self, nr: i64) -> i64;
    fn syscall1(&mut self, nr: i64, arg1: i64) -> i64;
    fn syscall2(&mut self, nr: i64, arg1: i64, arg2: i64) -> i64;
    fn syscall3(&mut self, nr: i64, arg1: i64, arg2: i64, arg3: i64) -> i64;
}

/// Forwards syscalls verbatim to the host kernel
#[derive(Debug, Default, Clone, Copy)]
pub struct HostSyscalls;

impl HostSyscalls {
    #[cfg(target_os = "linux")]
    fn raw(nr: i64, args: [i64; 3]) -> i64 {
        tracing::debug!(nr, ?args, "host syscall");
        // SAFETY: only integers cross the boundary; no Rust memory is lent
        // to the kernel.
        let ret = unsafe {
            libc::syscall(
                nr as libc::c_long,
                args[0] as libc::c_long,
                args[1] as libc::c_long,
                args[2] as libc::c_long,
            )
        };
        if ret == -1 {
            let errno = std::io::Error::last_os_error().raw_os_error().unwrap_or(0);
            return -i64::from(errno);
        }
        ret as i64
    }

    #[cfg(not(target_os = "linux"))]
    fn raw(nr: i64, args: [i64; 3]) -> i64 {
        tracing::warn!(nr, ?args, "raw syscalls are only supported on Linux");
        ENOSYS
    }
}

impl Syscalls for HostSyscalls {
    fn syscall0(&mut self, nr: i64) -> i64 {
        Self::raw(nr, [0, 0, 0])
    }

    fn syscall1(&mut self, nr: i64, arg1: i64) -> i64 {
        Self::raw(nr, [arg1, 0, 0])
    }

    fn syscall2(&mut self, nr: i64, arg1: i64, arg2: i64) -> i64 {
        Self::raw(nr, [arg1, arg2, 0])
    }

    fn syscall3(&mut self, nr: i64, arg1: i64, arg2: i64, arg3: i64) -> i64 {
        Self::raw(nr, [arg1, arg2, arg3])
    }
}

#[cfg(all(test, target_os = "linux"))]
mod tests {
    use super::*;

    #[test]
    fn test_host_getpid() {
        let pid = HostSyscalls.syscall0(libc::SYS_getpid as i64);
        assert_eq!(pid, i64::from(std::process::id()));
    }

    #[test]
    fn test_host_errors_are_negative_errno() {
        // close(-1) fails with EBADF
        let ret = HostSyscalls.syscall1(libc::SYS_close as i64, -1);
        assert_eq!(ret, -i64::from(libc::EBADF));
    }
}
