// Version resource and application manifest for winsweep.exe.

#[cfg(windows)]
const MANIFEST: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<assembly xmlns="urn:schemas-microsoft-com:asm.v1" manifestVersion="1.0">
  <trustInfo xmlns="urn:schemas-microsoft-com:asm.v3">
    <security>
      <requestedPrivileges>
        <requestedExecutionLevel level="asInvoker" uiAccess="false"/>
      </requestedPrivileges>
    </security>
  </trustInfo>
  <application xmlns="urn:schemas-microsoft-com:asm.v3">
    <windowsSettings xmlns:ws2="http://schemas.microsoft.com/SMI/2016/WindowsSettings">
      <ws2:longPathAware>true</ws2:longPathAware>
    </windowsSettings>
  </application>
</assembly>
"#;

fn main() {
    // asInvoker: tasks needing elevation are skipped unless started elevated.
    #[cfg(windows)]
    {
        let version = env!("CARGO_PKG_VERSION");
        let mut parts = version.split(['.', '-']);
        let file_version = format!(
            "{}.{}.{}.0",
            parts.next().unwrap_or("0"),
            parts.next().unwrap_or("0"),
            parts.next().unwrap_or("0")
        );

        let mut res = winres::WindowsResource::new();
        res.set("ProductName", "winsweep")
            .set("FileDescription", env!("CARGO_PKG_DESCRIPTION"))
            .set("InternalName", "winsweep")
            .set("OriginalFilename", "winsweep.exe")
            .set("CompanyName", env!("CARGO_PKG_AUTHORS"))
            .set("LegalCopyright", concat!("Licensed under ", env!("CARGO_PKG_LICENSE")))
            .set("FileVersion", &file_version)
            .set("ProductVersion", version)
            .set_manifest(MANIFEST);

        if let Err(e) = res.compile() {
            println!("cargo:warning=failed to compile Windows resources: {e}");
        }
    }

    println!("cargo:rerun-if-changed=build.rs");
}
