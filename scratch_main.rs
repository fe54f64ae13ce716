fn main() {
    let cases = [
        "null","true","0","-1","123456789","1.5","-2.25",
        r#""hello world""#,
        r#""esc \" \\ \n \t  text""#,
        r#""unicode: héllo 日本語 🦀""#,
        "[1,2,3]","[]","{}",
        r#"{"a":1,"b":"two","c":[true,null],"d":{"e":{}}}"#,
        r#"[{"deep":[{"deeper":[null]}]},-7,"end"]"#,
    ];
    for c in cases {
        match vpack::SliceBuf::parse(c) {
            Ok(_) => println!("OK: {}", c),
            Err(e) => println!("ERR ({}): {:?}", c, e),
        }
    }
}
