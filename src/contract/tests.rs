//! End-to-end VM scenarios, assembled from source

use crate::contract::compiler::Compiler;
use crate::contract::context::{
    ExecutionContext, ExecutionResult, ExecutionStatus, BRIDGE_TRANSFER_EVENT, CONTRACT_CALL_EVENT,
};
use crate::contract::error::{ErrorKind, VmError};
use crate::contract::program::Program;
use crate::contract::value::Value;
use crate::contract::vm::VM;
use crate::crypto::hash::sha256;
use crate::crypto::keys::KeyPair;
use crate::native::LocalBridge;
use crate::quantum::QuantumState;
use crate::runtime::RuntimeConfiguration;

fn assemble(source: &str) -> Program {
    Compiler::new().assemble(source).unwrap()
}

fn run_with(config: RuntimeConfiguration, source: &str, context: &mut ExecutionContext) -> ExecutionResult {
    VM::new(config).execute(assemble(source), context)
}

fn run(source: &str) -> ExecutionResult {
    run_with(
        RuntimeConfiguration::default(),
        source,
        &mut ExecutionContext::default(),
    )
}

fn quantum_config() -> RuntimeConfiguration {
    RuntimeConfiguration {
        quantum_support: true,
        ..Default::default()
    }
}

const CONSTANTS: &str = "
    .const x 3
    .const y 4
    LOAD x
    LOAD y
    ADD
    RETURN
";

#[test]
fn test_constants_sum() {
    let mut context = ExecutionContext::default().with_gas_limit(100);
    let result = run_with(RuntimeConfiguration::default(), CONSTANTS, &mut context);

    assert!(result.success);
    assert_eq!(result.return_value, Some(Value::Int(7)));
    assert_eq!(result.gas_used, 9);
    assert_eq!(context.gas_used, 9);
    assert!(result.error.is_none());
}

#[test]
fn test_out_of_gas_keeps_charged_prefix() {
    let mut context = ExecutionContext::default().with_gas_limit(5);
    let result = run_with(RuntimeConfiguration::default(), CONSTANTS, &mut context);

    assert!(!result.success);
    assert_eq!(result.status, ExecutionStatus::OutOfGas);
    assert_eq!(result.error_kind(), Some(ErrorKind::OutOfGas));
    // The second LOAD would need 6 > 5
    assert_eq!(result.gas_used, 3);
    assert_eq!(context.gas_used, 3);
}

#[test]
fn test_infinite_loop_exhausts_gas() {
    let mut context = ExecutionContext::default().with_gas_limit(50);
    let result = run_with(
        RuntimeConfiguration::default(),
        ":loop\nJUMP loop",
        &mut context,
    );

    assert_eq!(result.status, ExecutionStatus::OutOfGas);
    assert_eq!(result.gas_used, 50);
}

#[test]
fn test_countdown_loop() {
    let result = run("
        PUSH 3
        STOREL n
        :loop
        LOADL n
        ISZERO
        JUMPI done
        LOADL n
        PUSH 1
        SUB
        STOREL n
        JUMP loop
        :done
        LOADL n
        RETURN
    ");

    assert!(result.success);
    assert_eq!(result.return_value, Some(Value::Int(0)));
}

#[test]
fn test_deterministic_replay() {
    let source = "
        QGATE H 0
        QGATE H 1
        QGATE CNOT 0 2
        QMEASURE
        POP
        PUSH 1000
        CALL random 1
        CALL print 1
        POP
        PUSH 42
        EMIT Answer
        PUSH 1
        RETURN
    ";
    let context = ExecutionContext::new("contract", "caller")
        .with_quantum(QuantumState::new())
        .with_entropy([7u8; 32]);

    let first = run_with(quantum_config(), source, &mut context.clone());
    let second = run_with(quantum_config(), source, &mut context.clone());

    assert!(first.success);
    assert_eq!(first.return_value, second.return_value);
    assert_eq!(first.gas_used, second.gas_used);
    assert_eq!(first.logs, second.logs);
    assert_eq!(first.events, second.events);
    assert_eq!(first.measurements, second.measurements);
    assert_eq!(first.measurements.len(), 3);
}

#[test]
fn test_gas_increases_every_step() {
    let program = assemble(
        "
        PUSH 2
        PUSH 3
        MUL
        STORE product
        LOAD product
        RETURN
    ",
    );
    let mut vm = VM::default();
    vm.load(program, &ExecutionContext::default(), None).unwrap();

    let mut previous = vm.gas_used();
    while !vm.status().is_terminal() {
        vm.step().unwrap();
        assert!(vm.gas_used() > previous);
        previous = vm.gas_used();
    }
    assert_eq!(previous, 1 + 1 + 2 + 5 + 3 + 1);
}

#[test]
fn test_function_call_balances_stack_and_frames() {
    let program = assemble(
        "
        PUSH 1
        PUSH 2
        CALL add 2
        RETURN
        .func add 2
        LOADL arg0
        LOADL arg1
        ADD
        RETURN
    ",
    );
    let mut vm = VM::default();
    vm.load(program, &ExecutionContext::default(), None).unwrap();

    let mut depths = vec![vm.state().call_stack.depth()];
    while !vm.status().is_terminal() {
        vm.step().unwrap();
        depths.push(vm.state().call_stack.depth());
    }
    // main, main, main, add, add, add, add, main, main
    assert_eq!(depths, vec![1, 1, 1, 2, 2, 2, 2, 1, 1]);

    let result = vm.result();
    assert!(result.success);
    assert_eq!(result.return_value, Some(Value::Int(3)));
    assert_eq!(result.max_call_depth, 2);
    assert_eq!(result.gas_used, 1 + 1 + 10 + 2 + 2 + 2 + 1 + 1);
    assert!(vm.state().operand_stack.is_empty());
}

#[test]
fn test_callee_cannot_pop_caller_values() {
    let result = run("
        PUSH 9
        CALL f 0
        HALT
        .func f 0
        POP
        RETURN
    ");

    assert_eq!(result.error_kind(), Some(ErrorKind::StackUnderflow));
    assert_eq!(result.status, ExecutionStatus::Faulted);
}

#[test]
fn test_entry_point_binds_call_data() {
    let program = assemble(
        "
        HALT
        .func sum 2
        LOADL arg0
        LOADL arg1
        ADD
        RETURN
    ",
    );
    let mut context =
        ExecutionContext::default().with_call_data(vec![Value::Int(5), Value::Int(6)]);
    let result = VM::default().execute_entry(program.clone(), &mut context, Some("sum"));
    assert_eq!(result.return_value, Some(Value::Int(11)));

    let mut context = ExecutionContext::default();
    let result = VM::default().execute_entry(program.clone(), &mut context, Some("sum"));
    assert_eq!(result.error_kind(), Some(ErrorKind::ArityMismatch));

    let result = VM::default().execute_entry(program, &mut context, Some("missing"));
    assert_eq!(result.error_kind(), Some(ErrorKind::UnknownEntryPoint));
    assert_eq!(result.gas_used, 0);
}

#[test]
fn test_entry_arity_counts_all_call_data() {
    let program = assemble("HALT\n.func wide 255\nHALT");
    let mut context = ExecutionContext::default().with_call_data(vec![Value::Int(0); 300]);
    let result = VM::default().execute_entry(program.clone(), &mut context, Some("wide"));
    assert_eq!(result.error_kind(), Some(ErrorKind::ArityMismatch));

    let mut context = ExecutionContext::default().with_call_data(vec![Value::Int(0); 255]);
    let result = VM::default().execute_entry(program, &mut context, Some("wide"));
    assert!(result.success);
}

#[test]
fn test_call_depth_limit() {
    let config = RuntimeConfiguration {
        max_call_depth: 8,
        ..Default::default()
    };
    let result = run_with(
        config,
        "
        CALL rec 0
        .func rec 0
        CALL rec 0
    ",
        &mut ExecutionContext::default(),
    );

    assert_eq!(result.error_kind(), Some(ErrorKind::CallDepthExceeded));
    assert_eq!(result.max_call_depth, 8);
}

#[test]
fn test_arity_mismatch_on_call() {
    let result = run("
        PUSH 1
        CALL pair 1
        .func pair 2
        RETURN
    ");
    assert_eq!(result.error_kind(), Some(ErrorKind::ArityMismatch));
}

#[test]
fn test_faults() {
    let cases = [
        ("PUSH 1\nPUSH 0\nDIV", ErrorKind::DivisionByZero),
        ("PUSH 1\nTRUE\nADD", ErrorKind::TypeMismatch),
        ("ADD", ErrorKind::StackUnderflow),
        ("LOAD nothing", ErrorKind::HeapKeyNotFound),
        ("LOADL nothing", ErrorKind::HeapKeyNotFound),
        ("REG nothing", ErrorKind::UnknownRegister),
        ("CALL nope 0", ErrorKind::UnknownNativeFunction),
        ("REVERT", ErrorKind::Reverted),
        ("PUSHREF dangling\nDEREF", ErrorKind::HeapKeyNotFound),
    ];

    for (source, kind) in cases {
        let result = run(source);
        assert!(!result.success, "{} should fail", source);
        assert_eq!(result.status, ExecutionStatus::Faulted);
        assert_eq!(result.error_kind(), Some(kind), "{}", source);
    }
}

#[test]
fn test_registers_and_logs() {
    let mut context = ExecutionContext::new("0xcontract", "0xalice").with_call_data(vec![Value::Int(1)]);
    context.block_number = 12;
    let result = run_with(
        RuntimeConfiguration::default(),
        "
        REG caller
        LOG
        REG block_number
        REG argc
        ADD
        RETURN
    ",
        &mut context,
    );

    assert_eq!(result.logs, vec!["0xalice".to_string()]);
    assert_eq!(result.return_value, Some(Value::Int(13)));
}

#[test]
fn test_heap_references_and_pack() {
    let result = run("
        PUSH 10
        STORE inner
        PUSHREF inner
        PUSH 2
        PACK 2
        STORE outer
        PUSHREF inner
        DEREF
        RETURN
    ");

    assert!(result.success);
    assert_eq!(result.return_value, Some(Value::Int(10)));
}

#[test]
fn test_gc_keeps_reachable_graph() {
    let program = assemble(
        "
        PUSH 1
        STORE leaf
        PUSHREF leaf
        PUSH 0
        PACK 2
        STORE list
        PUSHREF list
        STORE head
        PUSH 2
        STORE garbage
        PUSHREF head
        STOREL root
        HALT
    ",
    );
    let mut vm = VM::default();
    let result = vm.execute(program, &mut ExecutionContext::default());
    assert!(result.success);

    let report = vm.collect_garbage().unwrap();
    let heap = &vm.state().heap;
    assert_eq!(report.objects_freed, 1);
    assert!(heap.contains("head"));
    assert!(heap.contains("list"));
    assert!(heap.contains("leaf"));
    assert!(!heap.contains("garbage"));
}

#[test]
fn test_gc_request_waits_for_call_boundary() {
    let program = assemble(
        "
        .const x 3
        .const y 4
        PUSH 2
        STORE garbage
        LOAD x
        LOAD y
        ADD
        RETURN
    ",
    );
    let mut vm = VM::default();
    let trigger = vm.gc_trigger();
    vm.load(program, &ExecutionContext::default(), None).unwrap();

    vm.step().unwrap();
    vm.step().unwrap();
    trigger.request().unwrap();
    vm.step().unwrap();
    assert!(vm.service_gc_requests().is_none());
    assert!(vm.state().heap.contains("y"));

    vm.run();
    let result = vm.result();
    assert!(result.success);
    assert_eq!(result.return_value, Some(Value::Int(7)));
    assert!(result.gc_reports.is_empty());
    assert_eq!(result.gas_used, 1 + 5 + 3 + 3 + 2 + 1);

    let report = vm.service_gc_requests().unwrap();
    assert_eq!(report.objects_freed, 1);
    assert!(!vm.state().heap.contains("garbage"));
    assert!(vm.state().heap.contains("x"));
    assert!(vm.service_gc_requests().is_none());
}

#[test]
fn test_gc_request_before_constants_are_read() {
    let mut vm = VM::default();
    let trigger = vm.gc_trigger();
    vm.load(assemble(CONSTANTS), &ExecutionContext::default(), None)
        .unwrap();

    vm.step().unwrap();
    trigger.request().unwrap();
    vm.run();

    let result = vm.result();
    assert_eq!(result.return_value, Some(Value::Int(7)));
    assert!(result.error.is_none());
    assert!(result.gc_reports.is_empty());
    assert_eq!(result.gas_used, 9);
}

#[test]
fn test_gc_trigger_ignored_when_disabled() {
    let config = RuntimeConfiguration {
        gc_enabled: false,
        ..Default::default()
    };
    let mut vm = VM::new(config);
    let trigger = vm.gc_trigger();
    vm.load(
        assemble("PUSH 2\nSTORE garbage\nHALT"),
        &ExecutionContext::default(),
        None,
    )
    .unwrap();

    trigger.request().unwrap();
    vm.run();
    assert!(vm.service_gc_requests().is_none());
    assert!(vm.state().heap.contains("garbage"));
    assert!(vm.result().gc_reports.is_empty());
    assert_eq!(vm.collect_garbage().unwrap_err(), VmError::GcDisabled);
}

#[test]
fn test_threshold_collection() {
    let config = RuntimeConfiguration {
        heap_size_limit: 1024,
        gc_threshold: 0.1,
        ..Default::default()
    };
    let mut source = String::new();
    for i in 0..8 {
        source.push_str(&format!("PUSH {}\nSTORE g{}\n", i, i));
    }
    source.push_str("PUSH 1\nRETURN\n");

    let result = run_with(config, &source, &mut ExecutionContext::default());

    assert!(result.success);
    assert!(!result.gc_reports.is_empty());
    assert!(result.gc_reports[0].objects_freed > 0);
}

#[test]
fn test_threshold_collection_keeps_constants() {
    let config = RuntimeConfiguration {
        heap_size_limit: 1024,
        gc_threshold: 0.1,
        ..Default::default()
    };
    let mut source = String::from(".const x 5\n");
    for i in 0..8 {
        source.push_str(&format!("PUSH {}\nSTORE g{}\n", i, i));
    }
    source.push_str("LOAD x\nRETURN\n");

    let result = run_with(config, &source, &mut ExecutionContext::default());

    assert!(!result.gc_reports.is_empty());
    assert_eq!(result.return_value, Some(Value::Int(5)));
}

#[test]
fn test_heap_limit() {
    let config = RuntimeConfiguration {
        heap_size_limit: 64,
        gc_enabled: false,
        ..Default::default()
    };
    let result = run_with(
        config,
        "PUSH 1\nSTORE a\nPUSH 2\nSTORE b\nPUSH 3\nSTORE c",
        &mut ExecutionContext::default(),
    );
    assert_eq!(result.error_kind(), Some(ErrorKind::HeapLimitExceeded));
}

#[test]
fn test_quantum_requires_support() {
    let source = "QGATE H 0";

    let mut context = ExecutionContext::default().with_quantum(QuantumState::new());
    let result = run_with(RuntimeConfiguration::default(), source, &mut context);
    assert_eq!(result.error_kind(), Some(ErrorKind::QuantumUnsupported));

    let result = run_with(quantum_config(), source, &mut ExecutionContext::default());
    assert_eq!(result.error_kind(), Some(ErrorKind::QuantumUnsupported));
}

#[test]
fn test_quantum_gates_and_measurement() {
    let program = assemble(
        "
        QGATE X 0
        QGATE CNOT 0 1
        QGATE H 2
        QMEASURE
        RETURN
    ",
    );
    let context = ExecutionContext::default().with_quantum(QuantumState::new());
    let mut vm = VM::new(quantum_config());
    vm.load(program, &context, None).unwrap();

    for _ in 0..3 {
        vm.step().unwrap();
        assert!(vm.state().quantum.qubits.values().all(|q| q.is_normalized()));
    }
    assert!(vm.state().quantum.get(1).unwrap().entangled);

    vm.run();
    let result = vm.result();

    assert!(result.success);
    assert_eq!(result.gas_used, 50 * 4 + 1);
    assert_eq!(result.measurements[&0], 1);
    assert_eq!(result.measurements[&1], 1);
    match result.return_value {
        Some(Value::List(outcomes)) => assert_eq!(outcomes.len(), 3),
        other => panic!("expected outcome list, got {:?}", other),
    }
    assert!(vm.state().quantum.qubits.values().all(|q| q.measured));
}

#[test]
fn test_gate_on_measured_qubit() {
    let mut context = ExecutionContext::default().with_quantum(QuantumState::new());
    let result = run_with(quantum_config(), "QGATE H 0\nQMEASURE\nQGATE X 0", &mut context);
    assert_eq!(result.error_kind(), Some(ErrorKind::QubitAlreadyMeasured));
}

#[test]
fn test_qubit_limit() {
    let config = RuntimeConfiguration {
        quantum_support: true,
        max_qubits: 2,
        ..Default::default()
    };
    let mut context = ExecutionContext::default().with_quantum(QuantumState::new());
    let result = run_with(config, "QGATE H 0\nQGATE H 1\nQGATE H 2", &mut context);
    assert_eq!(result.error_kind(), Some(ErrorKind::QubitLimitExceeded));
}

#[test]
fn test_native_hash_and_print() {
    let result = run("
        PUSH 5
        CALL print 1
        POP
        PUSHB 0x01
        CALL hash 1
        RETURN
    ");

    assert!(result.success);
    assert_eq!(result.logs, vec!["5".to_string()]);
    assert_eq!(result.return_value, Some(Value::Bytes(sha256(&[1]).to_vec())));
}

#[test]
fn test_native_verify() {
    let keypair = KeyPair::generate();
    let message = b"hello";
    let signature = keypair.sign(message).unwrap();
    let source = format!(
        "
        PUSHB 0x{}
        PUSHB 0x{}
        PUSHB 0x{}
        CALL verify 3
        RETURN
    ",
        hex::encode(keypair.public_key_bytes()),
        hex::encode(message),
        hex::encode(&signature)
    );

    let result = run(&source);
    assert_eq!(result.return_value, Some(Value::Bool(true)));

    let tampered = source.replace(&hex::encode(message), &hex::encode(b"jello"));
    let result = run(&tampered);
    assert_eq!(result.return_value, Some(Value::Bool(false)));
}

#[test]
fn test_native_random_is_bounded_and_seeded() {
    let source = "PUSH 10\nCALL random 1\nRETURN";
    let context = ExecutionContext::default().with_entropy([3u8; 32]);

    let first = run_with(RuntimeConfiguration::default(), source, &mut context.clone());
    let second = run_with(RuntimeConfiguration::default(), source, &mut context.clone());

    match &first.return_value {
        Some(Value::Int(n)) => assert!((0..10).contains(n)),
        other => panic!("expected Int, got {:?}", other),
    }
    assert_eq!(first.return_value, second.return_value);

    let result = run("PUSH 0\nCALL random 1");
    assert_eq!(result.error_kind(), Some(ErrorKind::NativeCallFailed));
}

#[test]
fn test_external_call_is_recorded() {
    let result = run("
        PUSH 100
        CALL token.transfer 1
        RETURN
    ");

    assert!(result.success);
    assert_eq!(result.return_value, Some(Value::Bool(true)));
    assert_eq!(result.events.len(), 1);
    assert_eq!(result.events[0].name, CONTRACT_CALL_EVENT);
}

#[test]
fn test_bridge_disabled() {
    let result = run("PUSHB 0xabcd\nBRIDGE eth");
    assert_eq!(result.error_kind(), Some(ErrorKind::CrossChainDisabled));
    assert!(result.events.is_empty());
}

#[test]
fn test_bridge_transfer() {
    let config = RuntimeConfiguration {
        cross_chain_enabled: true,
        ..Default::default()
    };
    let bridge = LocalBridge::with_chains(["eth"]).shared();
    let mut vm = VM::new(config).with_bridge(bridge.clone());

    let result = vm.execute(
        assemble("PUSHB 0xabcd\nBRIDGE eth\nRETURN"),
        &mut ExecutionContext::default(),
    );
    assert!(result.success);
    assert_eq!(result.gas_used, 1 + 100 + 1);
    assert_eq!(result.events[0].name, BRIDGE_TRANSFER_EVENT);
    match result.return_value {
        Some(Value::Bytes(id)) => assert_eq!(id.len(), 32),
        other => panic!("expected transfer id, got {:?}", other),
    }

    let result = vm.execute(
        assemble("PUSHB 0xabcd\nBRIDGE sol"),
        &mut ExecutionContext::default(),
    );
    assert_eq!(result.error_kind(), Some(ErrorKind::BridgeFailed));
}

#[test]
fn test_bridge_replay_is_deterministic() {
    let config = RuntimeConfiguration {
        cross_chain_enabled: true,
        ..Default::default()
    };
    let mut vm = VM::new(config);
    let source = "PUSHB 0xabcd\nBRIDGE eth\nPUSHB 0xabcd\nBRIDGE eth\nPACK 2\nRETURN";

    let first = vm.execute(assemble(source), &mut ExecutionContext::new("c", "alice"));
    let second = vm.execute(assemble(source), &mut ExecutionContext::new("c", "alice"));
    assert!(first.success);
    assert_eq!(first.return_value, second.return_value);
    assert_eq!(first.events, second.events);
    assert_ne!(first.events[0], first.events[1]);

    let other = vm.execute(assemble(source), &mut ExecutionContext::new("c", "bob"));
    assert_ne!(first.return_value, other.return_value);
}
