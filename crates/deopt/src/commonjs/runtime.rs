//! JavaScript sources emitted by [`super::CommonJsBundle`]
//!
//! The runtime defines the global `require` together with `require.define`
//! and `require.alias`, which every other fragment calls into. Resolution goes
//! through the `path` builtin, and every module receives the `process` shim, so
//! both builtins have to be defined before any user module is loaded.

/// Module id the path helper is registered under
pub const PATH_ID: &str = "path";

/// Module id the process shim is registered under
pub const PROCESS_ID: &str = "__browserify_process";

pub const REQUIRE_RUNTIME: &str = r#"var require = function (file, cwd) {
    var resolved = require.resolve(file, cwd || '/');
    var mod = require.modules[resolved];
    if (!mod) throw new Error(
        'Failed to resolve module ' + file + ', tried ' + resolved
    );
    var cached = require.cache[resolved];
    return cached ? cached.exports : mod();
};

require.paths = [];
require.modules = {};
require.cache = {};
require.aliases = {};
require.extensions = [".js", ".json"];

require._core = {
    'path': true,
    '__browserify_process': true
};

require.resolve = function (x, cwd) {
    if (!cwd) cwd = '/';

    if (require._core[x]) return x;
    if (Object.prototype.hasOwnProperty.call(require.aliases, x)) {
        return require.resolve(require.aliases[x], '/');
    }

    var path = require.modules.path();
    cwd = path.resolve('/', cwd);
    var y = cwd || '/';

    if (x.match(/^(?:\.\.?\/|\/)/)) {
        var m = loadAsFileSync(path.resolve(y, x))
            || loadAsDirectorySync(path.resolve(y, x));
        if (m) return m;
    }

    var n = loadNodeModulesSync(x, y);
    if (n) return n;

    throw new Error("Cannot find module '" + x + "'");

    function loadAsFileSync (x) {
        x = path.normalize(x);
        if (require.modules[x]) return x;

        for (var i = 0; i < require.extensions.length; i++) {
            var ext = require.extensions[i];
            if (require.modules[x + ext]) return x + ext;
        }
    }

    function loadAsDirectorySync (x) {
        x = x.replace(/\/+$/, '');
        return loadAsFileSync(x + '/index');
    }

    function loadNodeModulesSync (x, start) {
        var dirs = nodeModulesPathsSync(start);
        for (var i = 0; i < dirs.length; i++) {
            var dir = dirs[i];
            var m = loadAsFileSync(dir + '/' + x)
                || loadAsDirectorySync(dir + '/' + x);
            if (m) return m;
        }

        var m = loadAsFileSync(x);
        if (m) return m;
    }

    function nodeModulesPathsSync (start) {
        var parts = start === '/' ? [''] : start.split('/');
        var dirs = [];
        for (var i = parts.length - 1; i >= 0; i--) {
            if (parts[i] === 'node_modules') continue;
            dirs.push(parts.slice(0, i + 1).join('/') + '/node_modules');
        }
        return dirs;
    }
};

require.alias = function (from, to) {
    require.aliases[to] = from;
};

require.define = function (filename, fn) {
    var dirname = require._core[filename]
        ? '.'
        : require.modules.path().dirname(filename);

    var require_ = function (file) {
        return require(file, dirname);
    };
    require_.resolve = function (name) {
        return require.resolve(name, dirname);
    };
    require_.modules = require.modules;
    require_.define = require.define;
    require_.cache = require.cache;

    var module_ = {
        id: filename,
        filename: filename,
        exports: {},
        loaded: false
    };

    require.modules[filename] = function () {
        require.cache[filename] = module_;
        var process_ = filename === '__browserify_process'
            ? {}
            : require('__browserify_process');
        fn.call(
            module_.exports,
            require_,
            module_,
            module_.exports,
            dirname,
            filename,
            process_,
            typeof window !== 'undefined' ? window : this
        );
        module_.loaded = true;
        return module_.exports;
    };
};
"#;

pub const PATH_BUILTIN_BODY: &str = r#"function normalizeArray (parts, allowAboveRoot) {
    var up = 0;
    for (var i = parts.length; i >= 0; i--) {
        var last = parts[i];
        if (last == '.') {
            parts.splice(i, 1);
        } else if (last === '..') {
            parts.splice(i, 1);
            up++;
        } else if (up) {
            parts.splice(i, 1);
            up--;
        }
    }
    if (allowAboveRoot) {
        for (; up--; up) parts.unshift('..');
    }
    return parts;
}

function nonEmpty (p) { return !!p; }

exports.resolve = function () {
    var resolvedPath = '', resolvedAbsolute = false;
    for (var i = arguments.length; i >= -1 && !resolvedAbsolute; i--) {
        var path = (i >= 0) ? arguments[i] : process.cwd();
        if (typeof path !== 'string' || !path) continue;
        resolvedPath = path + '/' + resolvedPath;
        resolvedAbsolute = path.charAt(0) === '/';
    }
    resolvedPath = normalizeArray(resolvedPath.split('/').filter(nonEmpty), !resolvedAbsolute).join('/');
    return ((resolvedAbsolute ? '/' : '') + resolvedPath) || '.';
};

exports.normalize = function (path) {
    var isAbsolute = path.charAt(0) === '/',
        trailingSlash = path.slice(-1) === '/';
    path = normalizeArray(path.split('/').filter(nonEmpty), !isAbsolute).join('/');
    if (!path && !isAbsolute) path = '.';
    if (path && trailingSlash) path += '/';
    return (isAbsolute ? '/' : '') + path;
};

exports.join = function () {
    var paths = Array.prototype.slice.call(arguments, 0);
    return exports.normalize(paths.filter(function (p) {
        return p && typeof p === 'string';
    }).join('/'));
};

exports.dirname = function (path) {
    var dir = /^(.+)\/[^\/]*$/.exec(path);
    if (dir) return dir[1];
    return path.charAt(0) === '/' ? '/' : '.';
};

exports.basename = function (path, ext) {
    var f = path.split('/').pop();
    if (ext && f.substr(-1 * ext.length) === ext) {
        f = f.substr(0, f.length - ext.length);
    }
    return f;
};

exports.extname = function (path) {
    var m = /(\.[^.\/]*)$/.exec(path);
    return m ? m[1] : '';
};"#;

pub const PROCESS_BUILTIN_BODY: &str = r#"var process = module.exports = {};

process.nextTick = (function () {
    var canSetImmediate = typeof setImmediate !== 'undefined';
    if (canSetImmediate) {
        return function (f) { return setImmediate(f); };
    }
    return function (f) { setTimeout(f, 0); };
})();

process.title = 'browser';
process.browser = true;
process.env = {};
process.argv = [];

process.binding = function (name) {
    throw new Error('No such module. (Possibly not yet loaded)');
};

(function () {
    var cwd = '/';
    var path;
    process.cwd = function () { return cwd; };
    process.chdir = function (dir) {
        if (!path) path = require('path');
        cwd = path.resolve(dir, cwd);
    };
})();"#;
