//! Built-in names that are never produced and never renamed.

/// Keywords, strict-mode reserved words and contextual keywords that cannot
/// be used as a binding name somewhere in JS/TS.
pub const KEYWORDS: &[&str] = &[
    "abstract", "any", "arguments", "as", "async", "await", "boolean", "break", "case",
    "catch", "class", "const", "constructor", "continue", "debugger", "declare", "default",
    "delete", "do", "else", "enum", "eval", "export", "extends", "false", "finally", "for",
    "from", "function", "get", "if", "implements", "import", "in", "infer", "instanceof",
    "interface", "is", "keyof", "let", "module", "namespace", "never", "new", "null",
    "number", "object", "of", "package", "private", "protected", "public", "readonly",
    "require", "return", "set", "static", "string", "super", "switch", "symbol", "this",
    "throw", "true", "try", "type", "typeof", "undefined", "unique", "unknown", "var",
    "void", "while", "with", "yield",
];

/// Globals provided by ECMAScript hosts.
pub const RUNTIME_GLOBALS: &[&str] = &[
    "AggregateError", "Array", "ArrayBuffer", "Atomics", "BigInt", "BigInt64Array",
    "BigUint64Array", "Boolean", "DataView", "Date", "Error", "EvalError",
    "FinalizationRegistry", "Float32Array", "Float64Array", "Function", "Infinity",
    "Int16Array", "Int32Array", "Int8Array", "Intl", "JSON", "Map", "Math", "NaN", "Number",
    "Object", "Promise", "Proxy", "RangeError", "ReferenceError", "Reflect", "RegExp", "Set",
    "SharedArrayBuffer", "String", "Symbol", "SyntaxError", "TypeError", "URIError",
    "Uint16Array", "Uint32Array", "Uint8Array", "Uint8ClampedArray", "WeakMap", "WeakRef",
    "WeakSet", "clearInterval", "clearTimeout", "console", "decodeURI",
    "decodeURIComponent", "encodeURI", "encodeURIComponent", "escape", "exports",
    "globalThis", "isFinite", "isNaN", "module", "parseFloat", "parseInt", "queueMicrotask",
    "setInterval", "setTimeout", "unescape", "window",
    // Browser and Node hosts
    "AbortController", "Blob", "Buffer", "Document", "Element", "Event", "EventTarget",
    "FormData", "HTMLElement", "Headers", "KeyboardEvent", "MouseEvent", "Node", "Request",
    "Response", "TextDecoder", "TextEncoder", "URL", "URLSearchParams", "WebSocket",
    "Window", "XMLHttpRequest", "__dirname", "__filename", "alert", "atob", "btoa",
    "crypto", "document", "fetch", "global", "localStorage", "location", "navigator",
    "performance", "process", "requestAnimationFrame", "self", "sessionStorage",
    "setImmediate", "structuredClone",
    // TypeScript library types
    "ArrayLike", "Awaited", "Exclude", "Extract", "Generator", "InstanceType", "Iterable",
    "IterableIterator", "Iterator", "NonNullable", "Omit", "Parameters", "Partial", "Pick",
    "PromiseLike", "PropertyKey", "Readonly", "ReadonlyArray", "Record", "Required",
    "ReturnType",
];

/// Property names the runtime looks up by name, plus the methods and fields
/// of built-in objects, which live outside the project and cannot follow a
/// rename.
pub const RUNTIME_PROPERTIES: &[&str] = &[
    // Protocols
    "__proto__", "apply", "bind", "call", "catch", "constructor", "default", "done",
    "finally", "get", "has", "hasOwnProperty", "length", "message", "name", "next",
    "prototype", "return", "set", "stack", "then", "throw", "toJSON", "toLocaleString",
    "toString", "value", "valueOf", "cause", "enumerable", "configurable", "writable",
    // console
    "assert", "debug", "dir", "error", "group", "groupEnd", "info", "log", "table",
    "time", "timeEnd", "trace", "warn",
    // Array / String / iteration
    "at", "concat", "entries", "every", "fill", "filter", "find", "findIndex",
    "findLast", "findLastIndex", "flat", "flatMap", "forEach", "from", "includes",
    "indexOf", "isArray", "join", "keys", "lastIndexOf", "map", "of", "pop", "push",
    "reduce", "reduceRight", "reverse", "shift", "slice", "some", "sort", "splice",
    "unshift", "values", "charAt", "charCodeAt", "codePointAt", "endsWith", "match",
    "matchAll", "normalize", "padEnd", "padStart", "repeat", "replace", "replaceAll",
    "search", "split", "startsWith", "substring", "toLowerCase", "toUpperCase", "trim",
    "trimEnd", "trimStart", "raw",
    // Object / Reflect / JSON / Math / Number
    "assign", "create", "defineProperty", "defineProperties", "freeze", "fromEntries",
    "getOwnPropertyNames", "getPrototypeOf", "isFrozen", "seal", "setPrototypeOf",
    "parse", "stringify", "abs", "ceil", "floor", "max", "min", "pow", "random", "round",
    "sign", "sqrt", "trunc", "toFixed", "toPrecision", "isInteger", "isSafeInteger",
    // Map / Set / Promise / Date
    "add", "clear", "delete", "size", "all", "allSettled", "any", "race",
    "reject", "resolve", "now", "getTime", "toISOString",
    // Host objects
    "addEventListener", "removeEventListener", "dispatchEvent", "document", "exports",
    "getElementById", "querySelector", "querySelectorAll", "require", "setAttribute",
    "getAttribute", "appendChild", "removeChild", "style", "textContent", "innerHTML",
    "body", "head", "target", "type", "data", "status", "headers", "json", "text",
];

#[must_use]
pub fn is_keyword(name: &str) -> bool {
    KEYWORDS.contains(&name)
}

#[must_use]
pub fn is_runtime_global(name: &str) -> bool {
    RUNTIME_GLOBALS.contains(&name)
}

#[must_use]
pub fn is_runtime_property(name: &str) -> bool {
    RUNTIME_PROPERTIES.contains(&name)
}
