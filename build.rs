fn main() {
    // Embed Windows version info and icon
    #[cfg(target_os = "windows")]
    {
        let mut res = winres::WindowsResource::new();
        res.set("ProductName", "CineView");
        res.set("FileDescription", "CineView movie and TV catalog browser");

        if std::path::Path::new("assets/icon.ico").exists() {
            res.set_icon("assets/icon.ico");
        }

        if let Err(e) = res.compile() {
            eprintln!("Warning: Failed to embed resources: {}", e);
        }
    }
}
