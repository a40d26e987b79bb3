// Integration Test Utilities
//
// A small probe corpus shared by the CLI and pipeline suites

#![allow(dead_code)]

use guardminer::table::{Dialect, Table};
use std::fs;
use std::path::{Path, PathBuf};

pub const HEADER: &str =
    "id,app,version,sdk_min,sdk_trg,check,method,apis,apis_number,message,modified_files";

/// Three apps:
/// - app1 guards `a` in one method and `a&b` in another
/// - app2 guards `a&b`
/// - app3 swaps `x` for `y` below 21 and has one inconsistent method
pub const PROBES: &str = "\
1,app1,1.0,14,28,SDK_INT <= 5,A.f(),a,1,Guard a,1
2,app1,1.0,14,28,SDK_INT > 5,A.f(),,0,,
3,app1,1.0,14,28,SDK_INT <= 5,A.g(),a&b,2,Guard b,1
4,app1,1.0,14,28,SDK_INT > 5,A.g(),,0,,
5,app2,2.1,14,28,SDK_INT <= 5,B.f(),a&b,2,\"Use b, finally\",2
6,app2,2.1,14,28,SDK_INT > 5,B.f(),,0,,
7,app3,0.9,16,28,SDK_INT < 21,C.f(),x,1,,
8,app3,0.9,16,28,SDK_INT >= 21,C.f(),y,1,,
9,app3,0.9,16,28,SDK_INT == 23,C.g(),p,1,,
10,app3,0.9,16,28,SDK_INT < 5,C.g(),q,1,,
";

/// Write the merged probe table into `dir`
pub fn write_probes(dir: &Path) -> PathBuf {
    let path = dir.join("probes.csv");
    fs::write(&path, format!("{}\n{}", HEADER, PROBES)).unwrap();
    path
}

/// Write the same corpus as per-project tab-separated dumps
pub fn write_probe_dumps(dir: &Path) -> PathBuf {
    let dumps = dir.join("dumps");
    fs::create_dir_all(&dumps).unwrap();

    for app in ["app1", "app2", "app3"] {
        let mut text = HEADER.replace(',', "\t");
        text.push('\n');
        for line in PROBES.lines().filter(|l| l.contains(&format!(",{},", app))) {
            // dumps are unquoted: drop the quotes around the one quoted message
            let line = line.replace("\"Use b, finally\"", "Use b; finally");
            text.push_str(&line.replace(',', "\t"));
            text.push('\n');
        }
        fs::write(dumps.join(format!("{}.csv", app)), text).unwrap();
    }
    dumps
}

/// Data rows of a written ruleset CSV, fields unquoted
pub fn read_ruleset(path: &Path) -> Vec<Vec<String>> {
    let text = fs::read_to_string(path).unwrap();
    Table::parse(&text, Dialect::Comma, path).unwrap().rows
}
