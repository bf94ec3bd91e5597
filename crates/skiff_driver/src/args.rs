//! The resolved driver argument list consumed by job construction.
//!
//! Parsing the driver's own command line is somebody else's job; this module
//! only models the result: an ordered list of options and inputs, with the
//! helpers invocation rules use to forward options to tools.

/// Option spellings understood by the invocation rules.
pub mod opt {
    #![allow(missing_docs)]

    /// Spelling used for positional input arguments.
    pub const INPUT: &str = "<input>";

    pub const TARGET: &str = "-target";
    pub const TARGET_CPU: &str = "-target-cpu";
    pub const SDK: &str = "-sdk";
    pub const RESOURCE_DIR: &str = "-resource-dir";
    pub const I: &str = "-I";
    pub const F: &str = "-F";
    pub const FSYSTEM: &str = "-Fsystem";
    pub const D: &str = "-D";
    pub const L_PATH: &str = "-L";
    pub const L_LIB: &str = "-l";
    pub const FRAMEWORK: &str = "-framework";

    pub const G: &str = "-g";
    pub const GNONE: &str = "-gnone";
    pub const GLINE_TABLES_ONLY: &str = "-gline-tables-only";
    pub const GDWARF_TYPES: &str = "-gdwarf-types";
    pub const DEBUG_INFO_FORMAT: &str = "-debug-info-format=";
    pub const DEBUG_PREFIX_MAP: &str = "-debug-prefix-map";

    pub const O: &str = "-O";
    pub const ONONE: &str = "-Onone";
    pub const OSIZE: &str = "-Osize";
    pub const OUNCHECKED: &str = "-Ounchecked";

    pub const ENABLE_TESTING: &str = "-enable-testing";
    pub const MODULE_CACHE_PATH: &str = "-module-cache-path";
    pub const MODULE_LINK_NAME: &str = "-module-link-name";
    pub const SWIFT_VERSION: &str = "-swift-version";
    pub const WARNINGS_AS_ERRORS: &str = "-warnings-as-errors";
    pub const SUPPRESS_WARNINGS: &str = "-suppress-warnings";
    pub const COLOR_DIAGNOSTICS: &str = "-color-diagnostics";
    pub const PARSE_STDLIB: &str = "-parse-stdlib";
    pub const PARSE_SIL: &str = "-parse-sil";
    pub const PARSE_AS_LIBRARY: &str = "-parse-as-library";
    pub const ENFORCE_EXCLUSIVITY: &str = "-enforce-exclusivity=";
    pub const PROFILE_GENERATE: &str = "-profile-generate";
    pub const SANITIZE: &str = "-sanitize=";
    pub const SANITIZE_COVERAGE: &str = "-sanitize-coverage=";
    pub const STATIC: &str = "-static";
    pub const STATIC_STDLIB: &str = "-static-stdlib";
    pub const NO_TOOLCHAIN_STDLIB_RPATH: &str = "-no-toolchain-stdlib-rpath";
    pub const USE_LD: &str = "-use-ld=";

    pub const IMPORT_OBJC_HEADER: &str = "-import-objc-header";
    pub const INDEX_FILE_PATH: &str = "-index-file-path";
    pub const INDEX_STORE_PATH: &str = "-index-store-path";
    pub const WORKING_DIRECTORY: &str = "-working-directory";

    pub const XFRONTEND: &str = "-Xfrontend";
    pub const XCC: &str = "-Xcc";
    pub const XLLVM: &str = "-Xllvm";
    pub const XLINKER: &str = "-Xlinker";
    pub const DASH_DASH: &str = "--";

    /// Debug-info level options; the last one wins.
    pub const G_GROUP: &[&str] = &[G, GNONE, GLINE_TABLES_ONLY, GDWARF_TYPES];
    /// Optimization level options; the last one wins.
    pub const O_GROUP: &[&str] = &[O, ONONE, OSIZE, OUNCHECKED];
}

/// One resolved argument: an option spelling, its values, and its position.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Arg {
    option: String,
    values: Vec<String>,
    index: usize,
}

impl Arg {
    /// The option spelling, or [`opt::INPUT`] for positional inputs.
    pub fn option(&self) -> &str {
        &self.option
    }

    /// All values attached to this argument.
    pub fn values(&self) -> &[String] {
        &self.values
    }

    /// The first value, which for inputs is the path.
    pub fn value(&self) -> Option<&str> {
        self.values.first().map(String::as_str)
    }

    /// Position of this argument in its list.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Returns `true` for positional inputs.
    pub fn is_input(&self) -> bool {
        self.option == opt::INPUT
    }

    /// Appends this argument to `out` as a tool would expect to see it.
    ///
    /// Options ending in `=` are joined with their comma-separated values,
    /// other options are followed by each value as a separate token.
    pub fn render(&self, out: &mut Vec<String>) {
        if self.is_input() {
            out.extend(self.values.iter().cloned());
        } else if self.option.ends_with('=') {
            out.push(format!("{}{}", self.option, self.values.join(",")));
        } else {
            out.push(self.option.clone());
            out.extend(self.values.iter().cloned());
        }
    }
}

/// The ordered, resolved argument list of one compilation.
#[derive(Clone, Debug, Default)]
pub struct ArgList {
    args: Vec<Arg>,
}

impl ArgList {
    /// Creates an empty argument list.
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, option: &str, values: Vec<String>) -> Arg {
        let arg = Arg {
            option: option.to_string(),
            values,
            index: self.args.len(),
        };
        self.args.push(arg.clone());
        arg
    }

    /// Appends a positional input and returns it.
    pub fn push_input(&mut self, path: impl Into<String>) -> Arg {
        self.push(opt::INPUT, vec![path.into()])
    }

    /// Appends a flag without values.
    pub fn push_flag(&mut self, option: &str) -> Arg {
        self.push(option, Vec::new())
    }

    /// Appends an option with one value.
    pub fn push_value(&mut self, option: &str, value: impl Into<String>) -> Arg {
        self.push(option, vec![value.into()])
    }

    /// Appends an option with several values.
    pub fn push_values<I, S>(&mut self, option: &str, values: I) -> Arg
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.push(option, values.into_iter().map(Into::into).collect())
    }

    /// Iterates over every argument in order.
    pub fn iter(&self) -> impl Iterator<Item = &Arg> {
        self.args.iter()
    }

    /// Number of arguments.
    pub fn len(&self) -> usize {
        self.args.len()
    }

    /// Returns `true` if the list is empty.
    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    /// Iterates over positional inputs in order.
    pub fn inputs(&self) -> impl Iterator<Item = &Arg> {
        self.args.iter().filter(|a| a.is_input())
    }

    /// Returns `true` if any argument has the given spelling.
    pub fn has_arg(&self, option: &str) -> bool {
        self.args.iter().any(|a| a.option == option)
    }

    /// Iterates over arguments whose spelling is one of `options`.
    pub fn filtered<'a>(&'a self, options: &'a [&'a str]) -> impl Iterator<Item = &'a Arg> + 'a {
        self.args
            .iter()
            .filter(move |a| options.iter().any(|o| *o == a.option))
    }

    /// Returns the last argument whose spelling is one of `options`.
    pub fn last_arg(&self, options: &[&str]) -> Option<&Arg> {
        self.args
            .iter()
            .rev()
            .find(|a| options.iter().any(|o| *o == a.option))
    }

    /// Returns the first value of the last argument with the given spelling.
    pub fn last_arg_value(&self, option: &str) -> Option<&str> {
        self.last_arg(&[option]).and_then(Arg::value)
    }

    /// Collects every value of every argument with the given spelling.
    pub fn all_values(&self, option: &str) -> Vec<&str> {
        self.args
            .iter()
            .filter(|a| a.option == option)
            .flat_map(|a| a.values.iter().map(String::as_str))
            .collect()
    }

    /// Renders the last argument matching `options`, if any.
    pub fn add_last_arg(&self, out: &mut Vec<String>, options: &[&str]) {
        if let Some(arg) = self.last_arg(options) {
            arg.render(out);
        }
    }

    /// Renders every argument matching `options`, in order.
    pub fn add_all_args(&self, out: &mut Vec<String>, options: &[&str]) {
        for arg in self.filtered(options) {
            arg.render(out);
        }
    }

    /// Appends only the values of every argument matching `options`.
    ///
    /// Used for pass-through options such as `-Xfrontend`, whose values are
    /// themselves tool arguments.
    pub fn add_all_arg_values(&self, out: &mut Vec<String>, options: &[&str]) {
        for arg in self.filtered(options) {
            out.extend(arg.values.iter().cloned());
        }
    }
}
