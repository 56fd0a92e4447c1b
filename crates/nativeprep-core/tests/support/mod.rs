//! Scripted host for integration tests.

#![allow(dead_code)]

use nativeprep_core::PreflightConfig;
use nativeprep_core::context::PreflightContext;
use nativeprep_core::environment::Environment;
use nativeprep_core::homebrew::Homebrew;
use nativeprep_core::platform::{Arch, Os, Platform};
use nativeprep_core::process::{CommandOutput, CommandRunner, Invocation};
use nativeprep_core::runtime::Runtime;
use std::cell::RefCell;
use std::collections::HashMap;
use std::io;
use std::rc::Rc;

/// Answers commands from a table keyed by the full command line.
///
/// Unknown commands exit 1 with no output. Programs marked missing fail to
/// launch. Every call is recorded, and clones share the record.
#[derive(Clone, Default)]
pub struct ScriptedRunner {
    responses: Rc<RefCell<HashMap<String, CommandOutput>>>,
    missing: Rc<RefCell<Vec<String>>>,
    calls: Rc<RefCell<Vec<String>>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, command: &str, stdout: &str) -> &Self {
        self.responses
            .borrow_mut()
            .insert(command.to_string(), CommandOutput::ok(stdout));
        self
    }

    pub fn fail(&self, command: &str) -> &Self {
        self.responses
            .borrow_mut()
            .insert(command.to_string(), CommandOutput::failed(1));
        self
    }

    pub fn missing_program(&self, program: &str) -> &Self {
        self.missing.borrow_mut().push(program.to_string());
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.borrow().len()
    }

    pub fn was_called(&self, command: &str) -> bool {
        self.calls.borrow().iter().any(|c| c == command)
    }
}

impl CommandRunner for ScriptedRunner {
    fn run(&self, invocation: &Invocation) -> io::Result<CommandOutput> {
        let line = invocation.to_string();
        self.calls.borrow_mut().push(line.clone());
        if self.missing.borrow().contains(&invocation.program) {
            return Err(io::Error::new(io::ErrorKind::NotFound, "no such program"));
        }
        Ok(self
            .responses
            .borrow()
            .get(&line)
            .cloned()
            .unwrap_or_else(|| CommandOutput::failed(1)))
    }
}

pub const LDCONFIG_LISTING: &str = "\
5 libs found in cache `/etc/ld.so.cache'
\tlibavformat.so.57 (libc6,x86-64) => /usr/lib/x86_64-linux-gnu/libavformat.so.57
\tlibavcodec.so.57 (libc6,x86-64) => /usr/lib/x86_64-linux-gnu/libavcodec.so.57
\tlibavutil.so.55 (libc6,x86-64) => /usr/lib/x86_64-linux-gnu/libavutil.so.55
\tlibopencv_core.so.2.4 (libc6,x86-64) => /usr/lib/x86_64-linux-gnu/libopencv_core.so.2.4
\tlibOpenCL.so.1 (libc6,x86-64) => /usr/lib/x86_64-linux-gnu/libOpenCL.so.1
";

pub const OPENCV_LIBS: &str =
    "-L/usr/lib/x86_64-linux-gnu -lopencv_core -lopencv_imgproc -lopencv_ocl\n";

/// A Linux machine with every requirement installed.
pub fn healthy_linux_host() -> ScriptedRunner {
    let runner = ScriptedRunner::new();
    runner
        .respond("which pkg-config", "/usr/bin/pkg-config\n")
        .respond("which ldconfig", "/sbin/ldconfig\n")
        .respond("which python2.7-config", "/usr/bin/python2.7-config\n")
        .respond("ldconfig -p", LDCONFIG_LISTING)
        .respond("pkg-config --exists opencv", "")
        .respond("pkg-config --libs opencv", OPENCV_LIBS)
        .respond("pkg-config --cflags opencv", "-I/usr/include/opencv\n")
        .respond("pkg-config --cflags python-2.7", "-I/usr/include/python2.7\n")
        .respond("pkg-config --libs python-2.7", "-lpython2.7\n")
        .respond("python2 -c import cv2", "");
    runner
}

/// A macOS machine with Homebrew and every requirement installed.
pub fn healthy_darwin_host() -> ScriptedRunner {
    let runner = ScriptedRunner::new();
    runner
        .respond("which pkg-config", "/opt/homebrew/bin/pkg-config\n")
        .respond("which python2.7-config", "/opt/homebrew/bin/python2.7-config\n")
        .respond("which brew", "/opt/homebrew/bin/brew\n")
        .respond("pkg-config --exists opencv", "")
        .respond("pkg-config --exists avformat", "")
        .respond("pkg-config --exists avcodec", "")
        .respond("pkg-config --exists avutil", "")
        .respond("pkg-config --exists OpenCL", "")
        .respond("pkg-config --libs opencv", OPENCV_LIBS)
        .respond("pkg-config --cflags opencv", "-I/opt/homebrew/include/opencv\n")
        .respond("python2.7-config --prefix", "/opt/homebrew/opt/python@2/Frameworks/Python.framework/Versions/2.7\n")
        .respond("brew ls --versions numpy", "numpy 1.16.6\n")
        .respond("python2 -c import cv2", "");
    runner
}

pub fn linux() -> Platform {
    Platform::new(Os::Linux, Arch::X86_64)
}

pub fn darwin() -> Platform {
    Platform::new(Os::Darwin, Arch::Arm64)
}

/// Context on `platform` with runtime 2.7 and no host discovery.
pub fn context(runner: &ScriptedRunner, platform: Platform) -> PreflightContext {
    context_with(runner, platform, Runtime::new("python2", 2, 7), None)
}

pub fn context_with(
    runner: &ScriptedRunner,
    platform: Platform,
    runtime: Runtime,
    homebrew: Option<Homebrew>,
) -> PreflightContext {
    let config = PreflightConfig {
        source_root: "/src".into(),
        ..PreflightConfig::default()
    };
    PreflightContext::builder(config)
        .runner(runner.clone())
        .platform(platform)
        .environment(Environment::new())
        .runtime(runtime)
        .homebrew(homebrew)
        .build()
        .unwrap()
}
