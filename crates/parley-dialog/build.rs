use std::env;

fn main() {
    println!("cargo:rerun-if-env-changed=GENIE_SDK_LIB_DIR");

    // Only the `genie` feature needs a native library.
    if env::var_os("CARGO_FEATURE_GENIE").is_none() {
        return;
    }

    match env::var("GENIE_SDK_LIB_DIR") {
        Ok(dir) => println!("cargo:rustc-link-search=native={dir}"),
        Err(_) => println!(
            "cargo:warning=GENIE_SDK_LIB_DIR is not set, relying on the default linker search path for libGenie"
        ),
    }
    println!("cargo:rustc-link-lib=dylib=Genie");
}
