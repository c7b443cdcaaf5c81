use assert_cmd::Command;
use predicates::prelude::*;
use predicates::str::contains;

fn lmc() -> Command {
    let mut cmd = Command::cargo_bin("lmc").unwrap();
    cmd.env_remove("RUST_LOG");
    cmd
}

#[test]
fn runs_add() {
    lmc().arg("run").arg("tests/files/add.lmc")
        .assert()
        .success()
        .stdout("12\n");
}

#[test]
fn runs_countdown() {
    lmc().arg("run").arg("tests/files/countdown.lmc")
        .assert()
        .success()
        .stdout("3\n2\n1\n");
}

#[test]
fn reads_input_from_args() {
    lmc().args(["run", "tests/files/echo.lmc", "--input", "9"])
        .assert()
        .success()
        .stdout("9\n");

    lmc().args(["run", "tests/files/sum.lmc", "-i", "4", "-i", "-1", "-i", "10", "-i", "0"])
        .assert()
        .success()
        .stdout("13\n");
}

#[test]
fn reads_input_from_stdin() {
    lmc().args(["run", "tests/files/sum.lmc"])
        .write_stdin("4\n-1\n\n10\n0\n")
        .assert()
        .success()
        .stdout("13\n");

    // args first, then stdin
    lmc().args(["run", "tests/files/sum.lmc", "--input", "4", "--input", "-1"])
        .write_stdin("10\n0\n")
        .assert()
        .success()
        .stdout("13\n");
}

#[test]
fn skips_invalid_input() {
    lmc().args(["run", "tests/files/echo.lmc"])
        .write_stdin("abc\n9\n")
        .assert()
        .success()
        .stdout("9\n")
        .stderr(contains("ignoring input \"abc\""));
}

#[test]
fn fails_without_input() {
    lmc().args(["run", "tests/files/echo.lmc"])
        .write_stdin("")
        .assert()
        .failure()
        .stdout("")
        .stderr(contains("waiting for input at 00"));
}

#[test]
fn stops_at_limit() {
    lmc().args(["run", "tests/files/forever.lmc", "--limit", "10"])
        .assert()
        .failure()
        .stderr(contains("stopped after 10 instruction(s)"));
}

#[test]
fn limit_applies_before_input() {
    lmc().args(["run", "tests/files/echo.lmc", "--limit", "1"])
        .write_stdin("9\n")
        .assert()
        .failure()
        .stdout("")
        .stderr(contains("stopped after 1 instruction(s)"));
}

#[test]
fn applies_acc_policy() {
    lmc().args(["run", "tests/files/sum.lmc", "--policy", "wrap", "-i", "600", "-i", "700", "-i", "0"])
        .assert()
        .success()
        .stdout("300\n");

    lmc().args(["run", "tests/files/sum.lmc", "--policy", "clamp", "-i", "600", "-i", "700", "-i", "0"])
        .assert()
        .success()
        .stdout("999\n");

    lmc().args(["run", "tests/files/add.lmc", "--policy", "saturate"])
        .assert()
        .failure();
}

#[test]
fn reports_illegal_opcode_in_strict_mode() {
    lmc().args(["run", "tests/files/data_in_path.lmc"])
        .assert()
        .success()
        .stdout("");

    lmc().args(["run", "tests/files/data_in_path.lmc", "--strict"])
        .assert()
        .failure()
        .stderr(contains("illegal opcode 450"))
        .stderr(contains("data_in_path.lmc:2:1"));
}

#[test]
fn prints_image() {
    let expected = [
        "504 105 902 000 005 007 000 000 000 000",
        "000 000 000 000 000 000 000 000 000 000",
    ];

    lmc().args(["assemble", "tests/files/add.lmc"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with(format!("{}\n{}\n", expected[0], expected[1])))
        .stdout(predicate::function(|out: &str| out.lines().count() == 10));
}

#[test]
fn prints_listing() {
    lmc().args(["assemble", "tests/files/add.lmc", "--listing"])
        .assert()
        .success()
        .stdout(contains("00  504  LDA 04"))
        .stdout(contains("03  000  HLT"))
        .stdout(contains("04  005  DAT 5   A"))
        .stdout(contains("05  007  DAT 7   B"));
}

#[test]
fn checks_unknown_instruction() {
    lmc().args(["check", "tests/files/unknown.lmc"])
        .assert()
        .failure()
        .stderr(contains("unknown instruction: FOO"))
        .stderr(contains("unknown.lmc:2:1"))
        .stderr(contains("help: valid instructions are"));

    lmc().args(["run", "tests/files/unknown.lmc"])
        .assert()
        .failure()
        .stdout("");
}

#[test]
fn checks_operands() {
    lmc().args(["check", "tests/files/bad_operand.lmc"])
        .assert()
        .success()
        .stdout(contains("no errors found"));

    lmc().args(["check", "tests/files/bad_operand.lmc", "--strict"])
        .assert()
        .failure()
        .stderr(contains("operand is not a label or an integer"))
        .stderr(contains("bad_operand.lmc:1:5"));
}

#[test]
fn fails_on_missing_file() {
    lmc().args(["check", "tests/files/does_not_exist.lmc"])
        .assert()
        .failure()
        .stderr(contains("could not read"));
}
