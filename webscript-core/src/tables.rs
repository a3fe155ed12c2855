//! コンパイラに注入される不変のディスパッチテーブル群。
//!
//! キーワード→ハンドラの表が唯一の「文法」であり、新しい構文は
//! この表に1行足すだけで追加できる。プロトコルフックと演算子の表は、
//! ターゲット言語のオブジェクトモデルの予約識別子への対応付け。

extern crate alloc;
use alloc::collections::BTreeMap;

/// 代入演算子の一覧。連鎖代入や裸の文の判別に使う。
pub const SET_OPS: &[&str] = &[
    "+=", "-=", "**=", "//=", "*=", "/=", "%=", "&=", "|=", "^=", ">>=", "<<=", "@=", "=",
];

/// リソースブロックとして開ける外部アダプタの種別。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    MySql,
    Mongo,
}

impl ResourceKind {
    /// 出力に埋め込むアダプタのコンストラクタ名。
    pub fn constructor(self) -> &'static str {
        match self {
            ResourceKind::MySql => "MySql",
            ResourceKind::Mongo => "Mongo",
        }
    }

    /// ユニットにつき1回だけ注入するヘッダ行。
    pub fn header(self) -> &'static str {
        match self {
            ResourceKind::MySql => "from db_mysql import MySql",
            ResourceKind::Mongo => "from db_mongo import Mongo",
        }
    }
}

/// キーワードごとの構文ハンドラ。出力するキーワードだけが違う構文は
/// パラメータ化した1つのバリアントにまとめる。
#[derive(Debug, Clone, Copy)]
pub enum Handler {
    Class,
    Package,
    Import,
    Return,
    Break,
    Continue,
    /// `async` / `await`: インデント+キーワードだけを前置する。
    Prefix(&'static str),
    /// `;`まで読み、指定キーワードを先頭に付けて1行で通す。
    UntilEnd(&'static str),
    /// 条件を持たないブロック(`try`など)。
    SimpleBlock(&'static str),
    /// 条件付きブロック。`seeds_loop`は本体のLoopContextをGenericにする。
    Block {
        keyword: &'static str,
        seeds_loop: bool,
    },
    Do,
    For,
    Match,
    Enum,
    Abstract,
    Static,
    Resource(ResourceKind),
    Query,
    Terminate,
}

/// コンパイラへ注入するテーブル一式。プロセス開始時に1度だけ構築する。
pub struct Tables {
    pub statements: BTreeMap<&'static str, Handler>,
    pub hooks: BTreeMap<&'static str, &'static str>,
    pub operators: BTreeMap<&'static str, &'static str>,
}

impl Default for Tables {
    fn default() -> Self {
        Self::new()
    }
}

impl Tables {
    pub fn new() -> Self {
        Self {
            statements: statement_handlers(),
            hooks: protocol_hooks(),
            operators: operator_hooks(),
        }
    }
}

fn statement_handlers() -> BTreeMap<&'static str, Handler> {
    let mut table = BTreeMap::new();

    table.insert("class", Handler::Class);
    table.insert("package", Handler::Package);
    table.insert("import", Handler::Import);
    table.insert("async", Handler::Prefix("async"));
    table.insert("await", Handler::Prefix("await"));
    table.insert("return", Handler::Return);
    table.insert("break", Handler::Break);
    table.insert("continue", Handler::Continue);
    table.insert("@", Handler::UntilEnd("@"));
    table.insert("throw", Handler::UntilEnd("raise"));
    table.insert("super", Handler::UntilEnd("super"));
    table.insert("del", Handler::UntilEnd("del"));
    table.insert("assert", Handler::UntilEnd("assert"));
    table.insert("yield", Handler::UntilEnd("yield"));
    table.insert("external", Handler::UntilEnd("nonlocal"));
    table.insert("try", Handler::SimpleBlock("try"));
    table.insert("success", Handler::SimpleBlock("else"));
    table.insert("else", Handler::SimpleBlock("else"));
    table.insert(
        "catch",
        Handler::Block {
            keyword: "except",
            seeds_loop: false,
        },
    );
    table.insert(
        "if",
        Handler::Block {
            keyword: "if",
            seeds_loop: false,
        },
    );
    table.insert(
        "elif",
        Handler::Block {
            keyword: "elif",
            seeds_loop: false,
        },
    );
    table.insert(
        "with",
        Handler::Block {
            keyword: "with",
            seeds_loop: false,
        },
    );
    table.insert(
        "while",
        Handler::Block {
            keyword: "while",
            seeds_loop: true,
        },
    );
    table.insert("do", Handler::Do);
    table.insert("for", Handler::For);
    table.insert("match", Handler::Match);
    table.insert("enum", Handler::Enum);
    table.insert("abstract", Handler::Abstract);
    table.insert("static", Handler::Static);
    table.insert("mysql", Handler::Resource(ResourceKind::MySql));
    table.insert("mongo", Handler::Resource(ResourceKind::Mongo));
    table.insert("query", Handler::Query);
    table.insert("echo", Handler::UntilEnd("_PAGE_BUF+="));
    table.insert("reply", Handler::UntilEnd("return"));
    table.insert("terminate", Handler::Terminate);

    table
}

/// 名前付きプロトコルフックの表。
/// `delete`はディスクリプタプロトコルの`__delete__`に割り当てる
/// (デストラクタフックは表からは到達できない)。
fn protocol_hooks() -> BTreeMap<&'static str, &'static str> {
    let entries: &[(&str, &str)] = &[
        ("new", "__init__"),
        ("create", "__new__"),
        ("delete", "__delete__"),
        ("represent", "__repr__"),
        ("string", "__str__"),
        ("bytes", "__bytes__"),
        ("format", "__format__"),
        ("hash", "__hash__"),
        ("boolean", "__bool__"),
        ("getattribute", "__getattribute__"),
        ("setattribute", "__setattr__"),
        ("delattribute", "__delattr__"),
        ("setname", "__set_name__"),
        ("get", "__get__"),
        ("set", "__set__"),
        ("isinstance", "__instancecheck__"),
        ("issubclass", "__subclasscheck__"),
        ("call", "__call__"),
        ("length", "__len__"),
        ("iterable", "__iter__"),
        ("next", "__next__"),
        ("reverse", "__reversed__"),
        ("contains", "__contains__"),
        ("absolute", "__abs__"),
        ("complex", "__complex__"),
        ("integer", "__int__"),
        ("float", "__float__"),
        ("index", "__index__"),
        ("round", "__round__"),
        ("truncate", "__trunc__"),
        ("floor", "__floor__"),
        ("ceil", "__ceil__"),
        ("enter", "__enter__"),
        ("exit", "__exit__"),
        ("await", "__await__"),
        ("aiterable", "__aiter__"),
        ("anext", "__anext__"),
        ("aenter", "__aenter__"),
        ("aexit", "__aexit__"),
    ];
    entries.iter().copied().collect()
}

/// 記号演算子の表。`r`前置は右側オペランド版、`-x`/`+x`は単項。
fn operator_hooks() -> BTreeMap<&'static str, &'static str> {
    let entries: &[(&str, &str)] = &[
        ("<", "__lt__"),
        (">", "__gt__"),
        ("<=", "__le__"),
        (">=", "__ge__"),
        ("==", "__eq__"),
        ("!=", "__ne__"),
        ("[]", "__getitem__"),
        ("[]=", "__setitem__"),
        ("del[]", "__delitem__"),
        ("+", "__add__"),
        ("r+", "__radd__"),
        ("+=", "__iadd__"),
        ("-", "__sub__"),
        ("r-", "__rsub__"),
        ("-=", "__isub__"),
        ("*", "__mul__"),
        ("r*", "__rmul__"),
        ("*=", "__imul__"),
        ("@", "__matmul__"),
        ("r@", "__rmatmul__"),
        ("@=", "__imatmul__"),
        ("/", "__truediv__"),
        ("r/", "__rtruediv__"),
        ("/=", "__itruediv__"),
        ("//", "__floordiv__"),
        ("r//", "__rfloordiv__"),
        ("//=", "__ifloordiv__"),
        ("%", "__mod__"),
        ("r%", "__rmod__"),
        ("%=", "__imod__"),
        ("divmod()", "__divmod__"),
        ("divmod(r)", "__rdivmod__"),
        ("**", "__pow__"),
        ("r**", "__rpow__"),
        ("**=", "__ipow__"),
        ("<<", "__lshift__"),
        ("r<<", "__rlshift__"),
        ("<<=", "__ilshift__"),
        (">>", "__rshift__"),
        ("r>>", "__rrshift__"),
        (">>=", "__irshift__"),
        ("&", "__and__"),
        ("r&", "__rand__"),
        ("&=", "__iand__"),
        ("^", "__xor__"),
        ("r^", "__rxor__"),
        ("^=", "__ixor__"),
        ("|", "__or__"),
        ("r|", "__ror__"),
        ("|=", "__ior__"),
        ("-x", "__neg__"),
        ("+x", "__pos__"),
        ("~", "__invert__"),
    ];
    entries.iter().copied().collect()
}
