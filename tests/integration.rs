use assert_cmd::Command;
use std::fs::File;
use std::io::prelude::*;
use std::path::Path;

macro_rules! impc_test {
    ($name:tt, $code:expr) => {
        #[test]
        fn $name() {
            let path = Path::new("test_data").join(stringify!($name));
            let mut stdout_file =
                File::open(path.join("stdout")).expect("Failed to read stdout file");
            let mut expected_stdout = String::new();
            stdout_file
                .read_to_string(&mut expected_stdout)
                .expect("Failed to read stdout file");

            let mut stderr_file =
                File::open(path.join("stderr")).expect("Failed to read stderr file");
            let mut expected_stderr = String::new();
            stderr_file
                .read_to_string(&mut expected_stderr)
                .expect("Failed to read stderr file");

            Command::cargo_bin(env!("CARGO_PKG_NAME"))
                .unwrap()
                .arg(path.join("input.imp"))
                .args(["-o", "-"])
                .env("RUST_LOG", "off")
                .assert()
                .code($code)
                .stdout(expected_stdout)
                .stderr(expected_stderr);
        }
    };

    ($name:tt) => {
        impc_test!($name, 0);
    };
}

impc_test!(arith);
impc_test!(while_loop);
impc_test!(functions);
impc_test!(branches);
impc_test!(undefined_variable, 1);
impc_test!(syntax_error, 1);
