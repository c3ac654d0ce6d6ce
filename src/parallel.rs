use rayon::prelude::*;

///Exclusive prefix sum in place, starting from `init`. Returns the total.
pub fn exclusive_scan_in_place(io: &mut [i32], init: i32) -> i32 {
	let mut acc = init;
	for x in io.iter_mut() {
		let old_val = *x;
		*x = acc;
		acc += old_val;
	}
	acc
}

///`gather` copies elements from a source array into a new vector according to
///a map: `output[i] = input[map[i]]`.
pub fn gather<T>(map: &[usize], input: &[T]) -> Vec<T>
where
	T: Copy + Send + Sync,
{
	map.par_iter().map(|&i| input[i]).collect()
}

///`scatter` writes `input[i]` to `output[map[i]]`. If the same index appears
///more than once in `map`, which write wins is unspecified.
pub fn scatter<T>(input: &[T], map: &[usize], output: &mut [T])
where
	T: Copy,
{
	for (i, &value) in input.iter().enumerate() {
		output[map[i]] = value;
	}
}

///Reorders `in_out` so that `in_out[new] = old[new2old[new]]`. The result has
///the length of `new2old`, so this also drops entries that are not mapped.
pub fn permute<T>(in_out: &mut Vec<T>, new2old: &[usize])
where
	T: Copy + Send + Sync,
{
	*in_out = gather(new2old, in_out);
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn exclusive_scan() {
		let mut v = vec![1, 0, 1, 1, 0];
		let total = exclusive_scan_in_place(&mut v, 0);
		assert_eq!(v, vec![0, 1, 1, 2, 3]);
		assert_eq!(total, 3);
	}

	#[test]
	fn gather_scatter_permute() {
		let input = [10, 20, 30, 40];
		assert_eq!(gather(&[3, 0, 2], &input), vec![40, 10, 30]);

		let mut output = [0; 4];
		scatter(&[1, 2, 3, 4], &[2, 0, 3, 1], &mut output);
		assert_eq!(output, [2, 4, 1, 3]);

		let mut v = vec!['a', 'b', 'c', 'd'];
		permute(&mut v, &[2, 1]);
		assert_eq!(v, vec!['c', 'b']);
	}
}
