// 编译当前 crate 前，需要预先执行的操作
//
// 本文件修改自 https://github.com/rust-embedded/cortex-m-quickstart 仓库，可搭配 cortex-m-rt crate 一同使用
//
// 这个 crate 的核心逻辑还需要在 Host 上跑单元测试，
// 而 link.x 这类链接脚本只对 thumb 目标有意义，给 Host 的链接器传过去反而会让测试无法链接，
// 因此这里先判断一下目标平台，只有在为单片机编译时才输出链接相关的参数

use std::env;
use std::fs::File;
use std::io::Write;
use std::path::PathBuf;

fn main() {
    println!("cargo:rerun-if-changed=memory.x");
    println!("cargo:rerun-if-changed=build.rs");

    // TARGET 由 cargo 在运行 build script 时注入，形如 thumbv7em-none-eabihf
    let target = env::var("TARGET").unwrap_or_default();
    if !target.starts_with("thumb") {
        return;
    }

    let out = &PathBuf::from(env::var_os("OUT_DIR").unwrap());
    println!("cargo:rustc-link-search={}", out.display());

    File::create(out.join("memory.x"))
        .unwrap()
        .write_all(include_bytes!("memory.x"))
        .unwrap();

    println!("cargo:rustc-link-arg=--nmagic");

    // 使用 cortex-m-rt crate 提供的 link.x
    println!("cargo:rustc-link-arg=-Tlink.x");
}
