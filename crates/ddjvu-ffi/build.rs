// build.rs - ddjvu-ffi
//
// Emits the link directives for the system DjVuLibre library.
//
// Library resolution (first match wins):
//
//   1. DDJVU_LIB_DIR=/path/to/dir  - added to the native search path
//   2. the default linker path     - e.g. /usr/lib/x86_64-linux-gnu
//
// Only dynamic linking is supported: a static libdjvulibre also needs the
// C++ runtime and libjpeg, which differ per platform.

fn main() {
    println!("cargo:rerun-if-env-changed=DDJVU_LIB_DIR");

    if let Ok(dir) = std::env::var("DDJVU_LIB_DIR") {
        if !dir.is_empty() {
            if !std::path::Path::new(&dir).is_dir() {
                // Friendly compile-time error rather than a cryptic linker failure.
                panic!("ddjvu-ffi: DDJVU_LIB_DIR points to a directory that does not exist: {dir}");
            }
            println!("cargo:rustc-link-search=native={dir}");
        }
    }

    println!("cargo:rustc-link-lib=dylib=djvulibre");
}
