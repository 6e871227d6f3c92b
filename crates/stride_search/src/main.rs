fn main() {
    if let Err(e) = lib_stride_search::init() {
        eprintln!("stride_search: {e}");
        std::process::exit(1);
    }
}
