//! 권한 상승 능력 — 시작 시 한 번 감지
//!
//! 모듈 적재/해제와 장치 노드 권한 변경은 root 권한이 필요합니다.
//! Linux에서는 `sudo`를 앞에 붙이고, 이미 root로 실행 중이면 그대로 실행합니다.
//! 그 외 플랫폼에서는 권한 상승을 지원하지 않으며, 조용히 건너뛰지 않고
//! 실행기가 치명적 에러를 반환합니다.

use serde::Serialize;

/// 호스트의 권한 상승 방식
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Privilege {
    /// `sudo` 접두어로 상승
    Sudo,
    /// 이미 유효 UID가 0
    Root,
    /// 지원하지 않는 플랫폼
    Unsupported,
}

impl Privilege {
    /// 현재 프로세스의 권한 상승 방식을 감지합니다.
    #[cfg(target_os = "linux")]
    pub fn detect() -> Self {
        if effective_uid_is_root() {
            Self::Root
        } else {
            Self::Sudo
        }
    }

    /// 현재 프로세스의 권한 상승 방식을 감지합니다.
    #[cfg(not(target_os = "linux"))]
    pub fn detect() -> Self {
        Self::Unsupported
    }

    pub fn is_supported(self) -> bool {
        !matches!(self, Self::Unsupported)
    }

    /// 상승된 실행을 위한 인자 벡터를 만듭니다.
    ///
    /// 지원하지 않는 플랫폼이면 `None`을 반환합니다.
    pub fn elevate(self, argv: &[String]) -> Option<Vec<String>> {
        match self {
            Self::Sudo => {
                let mut elevated = Vec::with_capacity(argv.len() + 1);
                elevated.push("sudo".to_owned());
                elevated.extend_from_slice(argv);
                Some(elevated)
            }
            Self::Root => Some(argv.to_vec()),
            Self::Unsupported => None,
        }
    }
}

#[cfg(target_os = "linux")]
fn effective_uid_is_root() -> bool {
    // SAFETY: geteuid(2) has no preconditions and cannot fail
    unsafe { libc::geteuid() == 0 }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| (*s).to_owned()).collect()
    }

    #[test]
    fn sudo_prefixes_command() {
        let elevated = Privilege::Sudo.elevate(&argv(&["insmod", "mydevice.ko"]));
        assert_eq!(elevated, Some(argv(&["sudo", "insmod", "mydevice.ko"])));
    }

    #[test]
    fn root_runs_command_unchanged() {
        let elevated = Privilege::Root.elevate(&argv(&["rmmod", "mydevice"]));
        assert_eq!(elevated, Some(argv(&["rmmod", "mydevice"])));
    }

    #[test]
    fn unsupported_refuses_to_elevate() {
        assert!(Privilege::Unsupported.elevate(&argv(&["rmmod", "x"])).is_none());
        assert!(!Privilege::Unsupported.is_supported());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn linux_detection_is_supported() {
        assert!(Privilege::detect().is_supported());
    }
}
