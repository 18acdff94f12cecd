//! System information helpers for the benchmark header.

/// Human-readable OS line, e.g. `Windows 11 (Build 22631)`.
pub fn os_description() -> String {
    let info = os_info::get();
    if let os_info::Type::Windows = info.os_type() {
        let build = info
            .version()
            .to_string()
            .split('.')
            .nth(2)
            .and_then(|s| s.parse::<u32>().ok());
        match build {
            Some(build) => format!("{} (Build {})", windows_release_name(build), build),
            None => "Windows (Unknown Build)".to_string(),
        }
    } else {
        info.to_string()
    }
}

/// Builds from 22000 on are Windows 11.
pub fn windows_release_name(build: u32) -> &'static str {
    if build >= 22000 {
        "Windows 11"
    } else {
        "Windows 10"
    }
}

/// Processor brand string, when the CPU exposes one.
#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
pub fn cpu_brand() -> Option<String> {
    raw_cpuid::CpuId::new()
        .get_processor_brand_string()
        .map(|brand| brand.as_str().trim().to_string())
}

#[cfg(not(any(target_arch = "x86", target_arch = "x86_64")))]
pub fn cpu_brand() -> Option<String> {
    None
}
