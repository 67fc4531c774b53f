//! Demonstration of model algebra and conversions
//!
//! Builds a small feedforward chain from transfer functions, converts it
//! to state space, and reduces it to a minimal realization.

use lti_rs::{
    minimal_realization, state_to_transfer, transfer_to_state, Lti, Sampling, State, Transfer,
};
use ndarray::arr2;

fn main() -> lti_rs::Result<()> {
    println!("=== Model Algebra Demonstration ===\n");

    // Lead compensator (s + 1)/(s + 2) followed by a plant 1/(s + 1)
    let lead = Transfer::siso(&[1.0, 1.0], &[1.0, 2.0])?;
    let plant = Transfer::siso(&[1.0], &[1.0, 1.0])?;
    println!("Compensator:\n{}", lead);
    println!("Plant:\n{}", plant);

    let open_loop = plant.matmul(&lead)?;
    let (num, den) = open_loop.entry(0, 0)?;
    println!("Open loop numerator:   {:?}", num);
    println!("Open loop denominator: {:?}\n", den);

    // The series product keeps the cancelled pole at -1
    let ss = transfer_to_state(&open_loop)?;
    println!("State realization with {} states", ss.states());
    println!("A = \n{}", ss.a());

    let reduced = minimal_realization(&ss, None)?;
    println!("\nMinimal realization with {} states", reduced.states());
    for prop in reduced.pole_properties() {
        println!(
            "  pole {:.4}: wn = {:.4} rad/s, zeta = {:.4}",
            prop.pole, prop.natural_frequency, prop.damping
        );
    }

    let back = state_to_transfer(&reduced)?;
    println!("\nBack to transfer form:\n{}", back);

    // Mixed arithmetic: a static gain in parallel with the reduced model
    let feedthrough: Lti = State::gain(arr2(&[[0.5]]))?.into();
    let total = Lti::from(reduced).try_add(&feedthrough)?;
    println!("Parallel sum is stable: {}", total.is_stable());

    // Discrete-time models keep their sampling through every operation
    let dz = Transfer::siso(&[0.2], &[1.0, -0.8])?.with_sampling(Sampling::discrete(0.1)?)?;
    let dz2 = dz.matmul(&dz)?;
    println!("\nDiscrete product:\n{}", dz2);

    Ok(())
}
