use clap::Parser;
use csvm::runtime::launcher;
use csvm::vm::{VMConfig, VM};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Class search path of directories
    #[arg(short, long)]
    class_path: Option<String>,

    /// The main class
    main_class: String,

    /// Arguments passed through to the program
    #[arg(trailing_var_arg = true)]
    args: Vec<String>,
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();
    let mut cfg = VMConfig::default();
    if let Some(class_path) = cli.class_path {
        cfg.set_class_path(&class_path);
    }
    cfg.set_main_class(&cli.main_class);
    let vm = VM::new(&cfg);
    let main_class = cli.main_class.replace('.', "/");
    let args = cli.args;

    let thread = std::thread::Builder::new()
        .stack_size(4 * 1024 * 1024)
        .name("main".to_string())
        .spawn(move || {
            let mut vm = vm;
            vm.init().unwrap();
            launcher::launch(vm, &main_class, &args, None);
            vm.destroy();
        })
        .unwrap();

    thread.join().unwrap();
}
