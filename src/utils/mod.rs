pub(crate) fn get_class_path_separator() -> &'static str {
    if cfg!(unix) {
        ":"
    } else if cfg!(windows) {
        ";"
    } else {
        todo!();
    }
}

pub(crate) fn get_file_separator() -> char {
    std::path::MAIN_SEPARATOR
}
