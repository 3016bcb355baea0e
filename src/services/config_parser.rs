use crate::error::{LoadError, ValidationError, ValidationErrors};
use crate::models::{LoadOptions, LogDateFormat, MemoryLimit, ProcessLaunchDescriptor, ScriptCheck};
use crate::utils::parse_js_config;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

/// 配置中可以出现的键，`env_<profile>` 另行处理
const KNOWN_KEYS: &[&str] = &[
    "name",
    "script",
    "interpreter",
    "cwd",
    "instances",
    "autorestart",
    "watch",
    "max_memory_restart",
    "error_file",
    "out_file",
    "log_date_format",
    "env",
    "args",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Json,
    /// ecosystem.config.js 风格的对象字面量，兼容 JSON
    JsLiteral,
}

impl SourceFormat {
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => SourceFormat::Json,
            _ => SourceFormat::JsLiteral,
        }
    }
}

pub struct ConfigParser;

impl ConfigParser {
    /// 从内联文本加载（对象字面量或 JSON）
    pub fn load_str(
        content: &str,
        options: &LoadOptions,
    ) -> Result<Vec<ProcessLaunchDescriptor>, LoadError> {
        let source = parse_js_config(content)?;
        Self::load_value(&source, None, options)
    }

    /// 从配置文件加载；未指定 cwd 的应用以配置文件所在目录为工作目录
    pub fn load_file(
        path: &Path,
        options: &LoadOptions,
    ) -> Result<Vec<ProcessLaunchDescriptor>, LoadError> {
        let content = fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let format = SourceFormat::from_path(path);
        tracing::debug!(path = %path.display(), ?format, "loading process configuration");

        let source: Value = match format {
            SourceFormat::Json => serde_json::from_str(&content)?,
            SourceFormat::JsLiteral => parse_js_config(&content)?,
        };

        let base_dir = Self::config_dir(path);
        Self::load_value(&source, base_dir.as_deref(), options)
    }

    /// 校验已经解析好的配置值，收集全部错误后一次性返回
    pub fn load_value(
        source: &Value,
        base_dir: Option<&Path>,
        options: &LoadOptions,
    ) -> Result<Vec<ProcessLaunchDescriptor>, LoadError> {
        let apps = Self::extract_apps(source)?;
        if apps.is_empty() {
            tracing::warn!("configuration contains no apps");
        }

        let mut descriptors = Vec::with_capacity(apps.len());
        let mut errors = Vec::new();

        for (index, app) in apps.iter().enumerate() {
            match Self::build_descriptor(index, app, base_dir, options) {
                Ok(descriptor) => descriptors.push(descriptor),
                Err(mut app_errors) => errors.append(&mut app_errors),
            }
        }

        // 名称唯一性需要先收集全部名称再判断
        errors.extend(Self::find_duplicate_names(apps));

        if errors.is_empty() {
            tracing::info!(count = descriptors.len(), "process configuration validated");
            Ok(descriptors)
        } else {
            tracing::debug!(errors = errors.len(), "process configuration rejected");
            Err(LoadError::Invalid(ValidationErrors::new(errors)))
        }
    }

    /// 支持 `{ apps: [...] }`、裸数组，以及只有一个应用的对象
    fn extract_apps(source: &Value) -> Result<&[Value], LoadError> {
        match source {
            Value::Array(apps) => Ok(apps.as_slice()),
            Value::Object(obj) => match obj.get("apps") {
                Some(Value::Array(apps)) => Ok(apps.as_slice()),
                Some(_) => Err(LoadError::MalformedSource("`apps` 必须是数组".to_string())),
                None if obj.contains_key("script") => Ok(std::slice::from_ref(source)),
                None => Err(LoadError::MalformedSource("缺少 `apps` 列表".to_string())),
            },
            _ => Err(LoadError::MalformedSource(
                "配置必须是对象或数组".to_string(),
            )),
        }
    }

    fn build_descriptor(
        index: usize,
        app: &Value,
        base_dir: Option<&Path>,
        options: &LoadOptions,
    ) -> Result<ProcessLaunchDescriptor, Vec<ValidationError>> {
        let Some(obj) = app.as_object() else {
            return Err(vec![ValidationError::InvalidField {
                app: format!("apps[{}]", index),
                field: "apps".to_string(),
                reason: "中的每一项必须是对象".to_string(),
            }]);
        };

        let mut fields = AppFields::new(index, obj);
        fields.warn_unknown_keys();

        let name = fields.required_str("name");
        let script = fields.required_str("script").map(PathBuf::from);

        let interpreter = fields
            .non_empty_str("interpreter")
            .filter(|value| value != "none");

        let working_directory = match fields.non_empty_str("cwd") {
            Some(cwd) if Path::new(&cwd).is_absolute() => Some(PathBuf::from(cwd)),
            Some(_) => {
                fields.invalid("cwd", "必须是绝对路径");
                None
            }
            None if fields.contains("cwd") => None,
            None => base_dir.map(Path::to_path_buf),
        };

        let instance_count = fields.instances();
        let auto_restart = fields.bool_or("autorestart", true);
        let watch_filesystem = fields.bool_or("watch", false);
        let max_memory_before_restart = fields.memory_limit();
        let error_log_path = fields.non_empty_str("error_file").map(PathBuf::from);
        let out_log_path = fields.non_empty_str("out_file").map(PathBuf::from);
        let log_timestamp_format = fields.log_date_format();

        let mut environment = fields.environment("env");
        if let Some(profile) = &options.env_profile {
            let key = format!("env_{}", profile);
            if fields.contains(&key) {
                environment.extend(fields.environment(&key));
            } else {
                tracing::debug!(app = %fields.label, profile = %profile, "no env block for profile");
            }
        }

        let args = fields.args();

        if let (ScriptCheck::Required, Some(script)) = (options.script_check, &script) {
            let resolved = match working_directory.as_deref().or(base_dir) {
                Some(dir) if script.is_relative() => dir.join(script),
                _ => script.clone(),
            };
            if !resolved.is_file() {
                fields.errors.push(ValidationError::ScriptNotFound {
                    app: fields.label.clone(),
                    path: resolved,
                });
            }
        }

        let AppFields { errors, .. } = fields;
        match (name, script, instance_count) {
            (Some(name), Some(script), Some(instance_count)) if errors.is_empty() => {
                Ok(ProcessLaunchDescriptor {
                    name,
                    script,
                    interpreter,
                    working_directory,
                    instance_count,
                    auto_restart,
                    watch_filesystem,
                    max_memory_before_restart,
                    error_log_path,
                    out_log_path,
                    log_timestamp_format,
                    environment,
                    args,
                })
            }
            _ => Err(errors),
        }
    }

    fn find_duplicate_names(apps: &[Value]) -> Vec<ValidationError> {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        let mut order = Vec::new();

        for name in apps
            .iter()
            .filter_map(|app| app.get("name").and_then(Value::as_str))
            .filter(|name| !name.trim().is_empty())
        {
            let count = counts.entry(name).or_insert(0);
            if *count == 0 {
                order.push(name);
            }
            *count += 1;
        }

        order
            .into_iter()
            .filter(|name| counts.get(name).copied().unwrap_or(0) > 1)
            .map(|name| ValidationError::DuplicateName {
                name: name.to_string(),
            })
            .collect()
    }

    fn config_dir(path: &Path) -> Option<PathBuf> {
        let absolute = if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir().ok()?.join(path)
        };
        absolute.parent().map(Path::to_path_buf)
    }
}

/// 单个应用记录的字段读取器，读取过程中累积校验错误
struct AppFields<'a> {
    label: String,
    fields: &'a Map<String, Value>,
    errors: Vec<ValidationError>,
}

impl<'a> AppFields<'a> {
    fn new(index: usize, fields: &'a Map<String, Value>) -> Self {
        let label = fields
            .get("name")
            .and_then(Value::as_str)
            .filter(|name| !name.trim().is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("apps[{}]", index));

        Self {
            label,
            fields,
            errors: Vec::new(),
        }
    }

    fn contains(&self, key: &str) -> bool {
        !matches!(self.fields.get(key), None | Some(Value::Null))
    }

    fn get(&self, key: &str) -> Option<&'a Value> {
        match self.fields.get(key) {
            None | Some(Value::Null) => None,
            Some(value) => Some(value),
        }
    }

    fn invalid(&mut self, field: &str, reason: &str) {
        self.errors.push(ValidationError::InvalidField {
            app: self.label.clone(),
            field: field.to_string(),
            reason: reason.to_string(),
        });
    }

    fn warn_unknown_keys(&self) {
        for key in self.fields.keys() {
            if !KNOWN_KEYS.contains(&key.as_str()) && !key.starts_with("env_") {
                tracing::warn!(app = %self.label, key = %key, "ignoring unknown configuration key");
            }
        }
    }

    fn str_value(&mut self, key: &str) -> Option<String> {
        match self.get(key)? {
            Value::String(s) => Some(s.clone()),
            _ => {
                self.invalid(key, "必须是字符串");
                None
            }
        }
    }

    fn required_str(&mut self, key: &'static str) -> Option<String> {
        if !self.contains(key) {
            self.errors.push(ValidationError::MissingRequiredField {
                app: self.label.clone(),
                field: key,
            });
            return None;
        }
        let value = self.str_value(key)?;
        if value.trim().is_empty() {
            self.errors.push(ValidationError::MissingRequiredField {
                app: self.label.clone(),
                field: key,
            });
            return None;
        }
        Some(value)
    }

    /// 可选字段，出现时不能是空字符串
    fn non_empty_str(&mut self, key: &str) -> Option<String> {
        let value = self.str_value(key)?;
        if value.trim().is_empty() {
            self.invalid(key, "不能为空");
            return None;
        }
        Some(value)
    }

    fn bool_or(&mut self, key: &str, default: bool) -> bool {
        match self.get(key) {
            None => default,
            Some(Value::Bool(b)) => *b,
            Some(_) => {
                self.invalid(key, "必须是布尔值");
                default
            }
        }
    }

    /// 缺省为 1；接受正整数或正整数字符串
    fn instances(&mut self) -> Option<u32> {
        let Some(value) = self.get("instances") else {
            return Some(1);
        };

        let parsed = match value {
            Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
            Value::String(s) => s.trim().parse::<u32>().ok(),
            _ => None,
        };

        match parsed {
            Some(count) if count >= 1 => Some(count),
            _ => {
                self.errors.push(ValidationError::InvalidInstanceCount {
                    app: self.label.clone(),
                    value: display_value(value),
                });
                None
            }
        }
    }

    /// 字符串按 K/M/G 后缀解析，数字按字节数解析
    fn memory_limit(&mut self) -> Option<MemoryLimit> {
        let value = self.get("max_memory_restart")?;
        let parsed = match value {
            Value::String(s) => s.parse::<MemoryLimit>().ok(),
            Value::Number(n) => n.as_u64().and_then(MemoryLimit::from_bytes),
            _ => None,
        };

        if parsed.is_none() {
            self.errors.push(ValidationError::InvalidMemoryLimit {
                app: self.label.clone(),
                value: display_value(value),
            });
        }
        parsed
    }

    fn log_date_format(&mut self) -> Option<LogDateFormat> {
        let pattern = self.str_value("log_date_format")?;
        let format = LogDateFormat::new(pattern);
        if format.is_none() {
            self.errors.push(ValidationError::InvalidLogDateFormat {
                app: self.label.clone(),
            });
        }
        format
    }

    fn environment(&mut self, key: &str) -> BTreeMap<String, String> {
        let mut env = BTreeMap::new();
        let Some(value) = self.get(key) else {
            return env;
        };
        let Some(obj) = value.as_object() else {
            self.invalid(key, "必须是对象");
            return env;
        };

        for (name, value) in obj {
            if !is_valid_env_key(name) {
                self.errors.push(ValidationError::InvalidEnvironmentKey {
                    app: self.label.clone(),
                    key: name.clone(),
                });
                continue;
            }

            let text = match value {
                Value::String(s) => s.clone(),
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                _ => {
                    self.invalid(&format!("{}.{}", key, name), "必须是字符串、数字或布尔值");
                    continue;
                }
            };
            env.insert(name.clone(), text);
        }

        env
    }

    /// 字符串按空白拆分，数组逐项取字符串
    fn args(&mut self) -> Vec<String> {
        match self.get("args") {
            None => Vec::new(),
            Some(Value::String(s)) => s.split_whitespace().map(str::to_string).collect(),
            Some(Value::Array(items)) => {
                let mut args = Vec::with_capacity(items.len());
                for item in items {
                    match item {
                        Value::String(s) => args.push(s.clone()),
                        Value::Number(n) => args.push(n.to_string()),
                        _ => {
                            self.invalid("args", "只能包含字符串");
                            return Vec::new();
                        }
                    }
                }
                args
            }
            Some(_) => {
                self.invalid("args", "必须是字符串或字符串数组");
                Vec::new()
            }
        }
    }
}

/// 环境变量名不能为空，也不能包含 `=` 或 NUL
fn is_valid_env_key(key: &str) -> bool {
    !key.is_empty() && !key.contains('=') && !key.contains('\0')
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => format!("\"{}\"", s),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXAMPLE: &str = r#"{apps:[{name:"count-checker", script:"./count_check_daemon.py", interpreter:"python3", cwd:"/home/user/webapp", instances:1, autorestart:true, watch:false, max_memory_restart:"200M", error_file:"/home/user/.pm2/logs/count-checker-error.log", out_file:"/home/user/.pm2/logs/count-checker-out.log", log_date_format:"YYYY-MM-DD HH:mm:ss", env:{TZ:"Asia/Shanghai"}}]}"#;

    fn load(content: &str) -> Result<Vec<ProcessLaunchDescriptor>, LoadError> {
        ConfigParser::load_str(content, &LoadOptions::default())
    }

    fn single_app(fields: &str) -> String {
        format!("{{ apps: [{{ {} }}] }}", fields)
    }

    fn errors_of(result: Result<Vec<ProcessLaunchDescriptor>, LoadError>) -> Vec<ValidationError> {
        match result {
            Err(LoadError::Invalid(errors)) => errors.as_slice().to_vec(),
            other => panic!("expected validation errors, got {:?}", other),
        }
    }

    #[test]
    fn loads_count_checker_example() {
        let descriptors = load(EXAMPLE).unwrap();
        assert_eq!(descriptors.len(), 1);

        let d = &descriptors[0];
        assert_eq!(d.name(), "count-checker");
        assert_eq!(d.script(), Path::new("./count_check_daemon.py"));
        assert_eq!(d.interpreter(), Some("python3"));
        assert_eq!(d.working_directory(), Some(Path::new("/home/user/webapp")));
        assert_eq!(d.instance_count(), 1);
        assert!(d.auto_restart());
        assert!(!d.watch_filesystem());
        assert_eq!(
            d.max_memory_before_restart().map(MemoryLimit::bytes),
            Some(200 * 1024 * 1024)
        );
        assert_eq!(
            d.error_log_path(),
            Some(Path::new("/home/user/.pm2/logs/count-checker-error.log"))
        );
        assert_eq!(
            d.out_log_path(),
            Some(Path::new("/home/user/.pm2/logs/count-checker-out.log"))
        );
        assert_eq!(
            d.log_timestamp_format().map(LogDateFormat::pattern),
            Some("YYYY-MM-DD HH:mm:ss")
        );
        let expected_env: BTreeMap<String, String> =
            [("TZ".to_string(), "Asia/Shanghai".to_string())].into_iter().collect();
        assert_eq!(d.environment(), &expected_env);
        assert_eq!(
            d.resolved_script(),
            PathBuf::from("/home/user/webapp/./count_check_daemon.py")
        );
    }

    #[test]
    fn loading_twice_yields_equal_descriptors() {
        assert_eq!(load(EXAMPLE).unwrap(), load(EXAMPLE).unwrap());
    }

    #[test]
    fn applies_documented_defaults() {
        let descriptors = load(&single_app("name: 'worker', script: 'worker.sh'")).unwrap();
        let d = &descriptors[0];
        assert_eq!(d.interpreter(), None);
        assert_eq!(d.working_directory(), None);
        assert_eq!(d.instance_count(), 1);
        assert!(d.auto_restart());
        assert!(!d.watch_filesystem());
        assert_eq!(d.max_memory_before_restart(), None);
        assert_eq!(d.error_log_path(), None);
        assert_eq!(d.out_log_path(), None);
        assert_eq!(d.log_timestamp_format(), None);
        assert!(d.environment().is_empty());
        assert!(d.args().is_empty());
    }

    #[test]
    fn missing_name_is_rejected() {
        let errors = errors_of(load(&single_app("script: 'a.py'")));
        assert_eq!(
            errors,
            vec![ValidationError::MissingRequiredField {
                app: "apps[0]".to_string(),
                field: "name",
            }]
        );

        let errors = errors_of(load(&single_app("name: '', script: 'a.py'")));
        assert!(matches!(
            errors[0],
            ValidationError::MissingRequiredField { field: "name", .. }
        ));
    }

    #[test]
    fn missing_script_is_rejected() {
        let errors = errors_of(load(&single_app("name: 'a'")));
        assert_eq!(
            errors,
            vec![ValidationError::MissingRequiredField {
                app: "a".to_string(),
                field: "script",
            }]
        );
    }

    #[test]
    fn instance_count_must_be_positive_integer() {
        for bad in ["0", "-1", "1.5", "'many'", "true"] {
            let source = single_app(&format!("name: 'a', script: 'a.py', instances: {}", bad));
            let errors = errors_of(load(&source));
            assert!(
                matches!(errors[0], ValidationError::InvalidInstanceCount { .. }),
                "instances {} should be rejected",
                bad
            );
        }

        let ok = load(&single_app("name: 'a', script: 'a.py', instances: 1")).unwrap();
        assert_eq!(ok[0].instance_count(), 1);
        let from_string = load(&single_app("name: 'a', script: 'a.py', instances: '4'")).unwrap();
        assert_eq!(from_string[0].instance_count(), 4);
    }

    #[test]
    fn memory_limit_grammar() {
        let errors = errors_of(load(&single_app(
            "name: 'a', script: 'a.py', max_memory_restart: '200X'",
        )));
        assert_eq!(
            errors,
            vec![ValidationError::InvalidMemoryLimit {
                app: "a".to_string(),
                value: "\"200X\"".to_string(),
            }]
        );

        for (text, bytes) in [
            ("200M", 200 * 1024 * 1024),
            ("1G", 1024 * 1024 * 1024),
            ("512K", 512 * 1024),
            ("512k", 512 * 1024),
        ] {
            let source = single_app(&format!("name: 'a', script: 'a.py', max_memory_restart: '{}'", text));
            let descriptors = load(&source).unwrap();
            assert_eq!(
                descriptors[0].max_memory_before_restart().map(MemoryLimit::bytes),
                Some(bytes)
            );
        }

        let raw = load(&single_app("name: 'a', script: 'a.py', max_memory_restart: 1048576")).unwrap();
        assert_eq!(
            raw[0].max_memory_before_restart().map(MemoryLimit::bytes),
            Some(1024 * 1024)
        );
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let source = r#"{ apps: [
            { name: "count-checker", script: "a.py" },
            { name: "other", script: "b.py" },
            { name: "count-checker", script: "c.py" },
        ] }"#;
        let errors = errors_of(load(source));
        assert_eq!(
            errors,
            vec![ValidationError::DuplicateName {
                name: "count-checker".to_string(),
            }]
        );
    }

    #[test]
    fn collects_errors_from_every_record() {
        let source = r#"{ apps: [
            { script: "a.py", instances: 0 },
            { name: "b", script: "b.py", max_memory_restart: "lots", env: { "A=B": "x" } },
            { name: "c", script: "c.py", log_date_format: "" },
        ] }"#;
        let errors = errors_of(load(source));
        assert_eq!(errors.len(), 5);
        assert!(matches!(errors[0], ValidationError::MissingRequiredField { field: "name", .. }));
        assert!(matches!(errors[1], ValidationError::InvalidInstanceCount { .. }));
        assert!(matches!(errors[2], ValidationError::InvalidMemoryLimit { .. }));
        assert!(matches!(errors[3], ValidationError::InvalidEnvironmentKey { ref key, .. } if key == "A=B"));
        assert!(matches!(errors[4], ValidationError::InvalidLogDateFormat { ref app } if app == "c"));
    }

    #[test]
    fn environment_values_are_stringified_and_keys_checked() {
        let descriptors = load(&single_app(
            "name: 'a', script: 'a.py', env: { PORT: 8080, DEBUG: false, TZ: 'UTC' }",
        ))
        .unwrap();
        let env = descriptors[0].environment();
        assert_eq!(env.get("PORT").map(String::as_str), Some("8080"));
        assert_eq!(env.get("DEBUG").map(String::as_str), Some("false"));
        assert_eq!(env.get("TZ").map(String::as_str), Some("UTC"));

        let errors = errors_of(load(&single_app("name: 'a', script: 'a.py', env: { '': 'x' }")));
        assert!(matches!(errors[0], ValidationError::InvalidEnvironmentKey { .. }));
    }

    #[test]
    fn env_profile_overrides_base_env() {
        let source = single_app(
            "name: 'a', script: 'a.py', env: { TZ: 'UTC', MODE: 'dev' }, env_production: { MODE: 'prod' }",
        );

        let plain = load(&source).unwrap();
        assert_eq!(plain[0].environment().get("MODE").map(String::as_str), Some("dev"));

        let options = LoadOptions {
            env_profile: Some("production".to_string()),
            ..LoadOptions::default()
        };
        let production = ConfigParser::load_str(&source, &options).unwrap();
        let env = production[0].environment();
        assert_eq!(env.get("MODE").map(String::as_str), Some("prod"));
        assert_eq!(env.get("TZ").map(String::as_str), Some("UTC"));

        let staging = LoadOptions {
            env_profile: Some("staging".to_string()),
            ..LoadOptions::default()
        };
        let fallback = ConfigParser::load_str(&source, &staging).unwrap();
        assert_eq!(fallback[0].environment().get("MODE").map(String::as_str), Some("dev"));
    }

    #[test]
    fn cwd_must_be_absolute() {
        let errors = errors_of(load(&single_app("name: 'a', script: 'a.py', cwd: 'relative/dir'")));
        assert_eq!(
            errors,
            vec![ValidationError::InvalidField {
                app: "a".to_string(),
                field: "cwd".to_string(),
                reason: "必须是绝对路径".to_string(),
            }]
        );
    }

    #[test]
    fn wrong_value_types_are_reported() {
        let errors = errors_of(load(&single_app(
            "name: 'a', script: 'a.py', autorestart: 'yes', interpreter: '', args: { x: 1 }",
        )));
        let fields: Vec<&str> = errors
            .iter()
            .filter_map(|e| match e {
                ValidationError::InvalidField { field, .. } => Some(field.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(fields, vec!["interpreter", "autorestart", "args"]);
    }

    #[test]
    fn interpreter_none_and_args_forms() {
        let descriptors = load(
            r#"[
                { name: "a", script: "run.sh", interpreter: "none", args: "--once --verbose" },
                { name: "b", script: "b.py", args: ["--port", 8000] },
            ]"#,
        )
        .unwrap();
        assert_eq!(descriptors[0].interpreter(), None);
        assert_eq!(descriptors[0].args(), ["--once", "--verbose"]);
        assert_eq!(descriptors[1].args(), ["--port", "8000"]);
    }

    #[test]
    fn malformed_sources_are_rejected() {
        assert!(matches!(load("{ apps: [ { name: 'a' "), Err(LoadError::MalformedSource(_))));
        assert!(matches!(load("{ services: [] }"), Err(LoadError::MalformedSource(_))));
        assert!(matches!(load("{ apps: {} }"), Err(LoadError::MalformedSource(_))));
        assert!(matches!(load("42"), Err(LoadError::MalformedSource(_))));
        assert!(load("{ apps: [] }").unwrap().is_empty());
        assert!(matches!(load(&"[".repeat(200_000)), Err(LoadError::MalformedSource(_))));

        let errors = errors_of(load("{ apps: ['a.py'] }"));
        assert!(matches!(errors[0], ValidationError::InvalidField { .. }));
    }

    #[test]
    fn json_surrogate_pairs_are_accepted() {
        let descriptors =
            load(r#"{"apps":[{"name":"a","script":"a.py","env":{"E":"\uD83D\uDE00"}}]}"#).unwrap();
        assert_eq!(descriptors[0].environment()["E"], "\u{1F600}");
    }

    #[test]
    fn single_app_object_is_accepted() {
        let descriptors = load("{ name: 'solo', script: 'solo.py' }").unwrap();
        assert_eq!(descriptors[0].name(), "solo");
    }

    #[test]
    fn load_file_defaults_cwd_to_config_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ecosystem.config.js");
        fs::write(
            &path,
            "module.exports = {\n  apps: [{ name: 'a', script: './a.py' }],\n};\n",
        )
        .unwrap();

        let descriptors = ConfigParser::load_file(&path, &LoadOptions::default()).unwrap();
        assert_eq!(descriptors[0].working_directory(), Some(dir.path()));
    }

    #[test]
    fn load_file_reads_json_and_reports_io_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("apps.json");
        fs::write(&path, r#"{"apps": [{"name": "a", "script": "a.py", "cwd": "/srv/a"}]}"#).unwrap();
        let descriptors = ConfigParser::load_file(&path, &LoadOptions::default()).unwrap();
        assert_eq!(descriptors[0].working_directory(), Some(Path::new("/srv/a")));

        // JSON 文件不接受对象字面量写法
        fs::write(&path, "{ apps: [] }").unwrap();
        assert!(matches!(
            ConfigParser::load_file(&path, &LoadOptions::default()),
            Err(LoadError::MalformedSource(_))
        ));

        let missing = dir.path().join("missing.js");
        assert!(matches!(
            ConfigParser::load_file(&missing, &LoadOptions::default()),
            Err(LoadError::Io { .. })
        ));
    }

    #[test]
    fn script_check_is_configurable() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("present.py"), "print('ok')\n").unwrap();
        let cwd = dir.path().display().to_string();
        let source = format!(
            r#"{{ apps: [
                {{ name: "present", script: "present.py", cwd: {cwd:?} }},
                {{ name: "absent", script: "absent.py", cwd: {cwd:?} }},
            ] }}"#
        );

        assert_eq!(load(&source).unwrap().len(), 2);

        let strict = LoadOptions {
            script_check: ScriptCheck::Required,
            ..LoadOptions::default()
        };
        let errors = errors_of(ConfigParser::load_str(&source, &strict));
        assert_eq!(
            errors,
            vec![ValidationError::ScriptNotFound {
                app: "absent".to_string(),
                path: dir.path().join("absent.py"),
            }]
        );
    }
}
