//! Platform/arch naming for release assets and `{placeholder}` templates

use std::sync::LazyLock;

use regex::Regex;

use crate::error::TemplateError;

static ARCH_386_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^i\d86$").unwrap());
static ARCH_PPC64_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^ppc64le$").unwrap());
static ARCH_ARM64_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(arm64|aarch64|armv8l)$").unwrap());
static ARCH_S390_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^s390x?$").unwrap());
static PLACEHOLDER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([A-Za-z_][A-Za-z0-9_]*)\}").unwrap());

/// Names used in release asset file names.
///
/// Machine names are classified by patterns (`i686` -> 386, `aarch64` ->
/// arm64, ...) checked in the order 386, ppc64le, arm64, s390x; anything
/// unmatched counts as amd64. Each name field holds what is written for
/// that class, each `*_re` field the pattern selecting it.
#[derive(Debug, Clone)]
pub struct ArchMapping {
    /// `Linux` -> `linux`
    pub lowercase_platform: bool,
    pub amd64: String,
    pub arm64: String,
    pub s390x: String,
    pub ppc64le: String,
    pub i386: String,
    pub arm64_re: Regex,
    pub s390x_re: Regex,
    pub ppc64le_re: Regex,
    pub i386_re: Regex,
}

impl Default for ArchMapping {
    fn default() -> Self {
        Self {
            lowercase_platform: true,
            amd64: "amd64".to_string(),
            arm64: "arm64".to_string(),
            s390x: "s390x".to_string(),
            ppc64le: "ppc64le".to_string(),
            i386: "386".to_string(),
            arm64_re: ARCH_ARM64_RE.clone(),
            s390x_re: ARCH_S390_RE.clone(),
            ppc64le_re: ARCH_PPC64_RE.clone(),
            i386_re: ARCH_386_RE.clone(),
        }
    }
}

// Regex has no PartialEq; patterns compare by source text
impl PartialEq for ArchMapping {
    fn eq(&self, other: &Self) -> bool {
        self.lowercase_platform == other.lowercase_platform
            && self.amd64 == other.amd64
            && self.arm64 == other.arm64
            && self.s390x == other.s390x
            && self.ppc64le == other.ppc64le
            && self.i386 == other.i386
            && self.arm64_re.as_str() == other.arm64_re.as_str()
            && self.s390x_re.as_str() == other.s390x_re.as_str()
            && self.ppc64le_re.as_str() == other.ppc64le_re.as_str()
            && self.i386_re.as_str() == other.i386_re.as_str()
    }
}

impl Eq for ArchMapping {}

impl ArchMapping {
    /// Map a system name (`Linux`, `Darwin`) and machine (`x86_64`) to
    /// `(platform, arch)`.
    pub fn map(&self, system: &str, machine: &str) -> (String, String) {
        let platform = if self.lowercase_platform {
            system.to_lowercase()
        } else {
            system.to_string()
        };

        let machine = machine.to_lowercase();
        let arch = if self.i386_re.is_match(&machine) {
            &self.i386
        } else if self.ppc64le_re.is_match(&machine) {
            &self.ppc64le
        } else if self.arm64_re.is_match(&machine) {
            &self.arm64
        } else if self.s390x_re.is_match(&machine) {
            &self.s390x
        } else {
            &self.amd64
        };

        (platform, arch.clone())
    }
}

/// System name of the running host, as `uname -s` reports it
pub fn host_system() -> String {
    match std::env::consts::OS {
        "linux" => "Linux".to_string(),
        "macos" => "Darwin".to_string(),
        "windows" => "Windows".to_string(),
        "freebsd" => "FreeBSD".to_string(),
        other => other.to_string(),
    }
}

/// Machine name of the running host, as `uname -m` reports it
pub fn host_machine() -> String {
    match std::env::consts::ARCH {
        "x86" => "i686".to_string(),
        "powerpc64" if cfg!(target_endian = "little") => "ppc64le".to_string(),
        other => other.to_string(),
    }
}

/// Replace `{name}` placeholders with the matching value from `vars`.
///
/// Unknown placeholders are an error; text without braces passes through
/// unchanged.
pub fn render_template(template: &str, vars: &[(&str, &str)]) -> Result<String, TemplateError> {
    let mut rendered = String::with_capacity(template.len());
    let mut last_end = 0;

    for caps in PLACEHOLDER_RE.captures_iter(template) {
        let whole = caps.get(0).unwrap();
        let name = &caps[1];
        let value = vars
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| *value)
            .ok_or_else(|| {
                TemplateError::UnknownPlaceholder(name.to_string(), template.to_string())
            })?;

        rendered.push_str(&template[last_end..whole.start()]);
        rendered.push_str(value);
        last_end = whole.end();
    }
    rendered.push_str(&template[last_end..]);

    Ok(rendered)
}
